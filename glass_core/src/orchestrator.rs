//! Decision loop: fuse both radars, decide ON/OFF, forward commands to the
//! actuator process, emit telemetry.
//!
//! Every fatal condition ends `run()` with a [`Fatal`]; the supervisor is
//! expected to restart the whole service.

use std::io;
use std::time::Instant;

use glass_config::ConfigWatch;
use glass_traits::FrameSource;
use glass_traits::clock::Clock;
use tracing::{error, info, warn};

use crate::command::Command;
use crate::config::{FusionCfg, OrchestratorCfg};
use crate::error::Fatal;
use crate::fusion::{FrameResult, RadarFusion};
use crate::telemetry::{Decision, TelemetryRecord, TelemetrySink};

/// How the actuator process ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorExit {
    /// `None` when it was terminated by a signal.
    pub code: Option<i32>,
}

/// Write side of the command channel plus liveness of the process behind it.
pub trait ActuatorLink {
    /// Send one command line and flush it.
    fn send(&mut self, cmd: Command) -> io::Result<()>;
    /// `Some` once the actuator has exited.
    fn poll_exit(&mut self) -> io::Result<Option<ActuatorExit>>;
}

impl<T: ActuatorLink + ?Sized> ActuatorLink for Box<T> {
    fn send(&mut self, cmd: Command) -> io::Result<()> {
        (**self).send(cmd)
    }

    fn poll_exit(&mut self) -> io::Result<Option<ActuatorExit>> {
        (**self).poll_exit()
    }
}

/// Outcome of one non-fatal tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// At least one radar poll failed; no decision was taken.
    Skipped,
    Decided(Decision),
}

pub struct Orchestrator<S: FrameSource, A: ActuatorLink, C: Clock + Clone> {
    radar_1: RadarFusion<S, C>,
    radar_2: RadarFusion<S, C>,
    link: A,
    clock: C,
    cfg: OrchestratorCfg,
    watch: Option<ConfigWatch>,
    telemetry: Option<Box<dyn TelemetrySink>>,
    glass_on: bool,
    /// `None` once the dwell runs past what `Instant` can represent.
    lockout_until: Option<Instant>,
}

impl<S: FrameSource, A: ActuatorLink, C: Clock + Clone> Orchestrator<S, A, C> {
    /// Starts with the glass assumed OFF and commands allowed immediately.
    pub fn new(
        radars: (S, S),
        fusion: (FusionCfg, FusionCfg),
        link: A,
        cfg: OrchestratorCfg,
        clock: C,
    ) -> Self {
        let lockout_until = Some(clock.now());
        Self {
            radar_1: RadarFusion::new(radars.0, fusion.0, clock.clone()),
            radar_2: RadarFusion::new(radars.1, fusion.1, clock.clone()),
            link,
            clock,
            cfg,
            watch: None,
            telemetry: None,
            glass_on: false,
            lockout_until,
        }
    }

    /// Exit with [`Fatal::ConfigChanged`] once the watched file changes.
    pub fn with_config_watch(mut self, watch: ConfigWatch) -> Self {
        self.watch = Some(watch);
        self
    }

    pub fn with_telemetry(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }

    pub fn tick(&mut self) -> Result<Tick, Fatal> {
        if self.watch.as_ref().is_some_and(ConfigWatch::has_changed) {
            return Err(Fatal::ConfigChanged);
        }

        let r1 = self.radar_1.process();
        let r2 = self.radar_2.process();
        for (idx, result, fusion) in [(1u8, r1, &self.radar_1), (2u8, r2, &self.radar_2)] {
            if result == FrameResult::PollFailed && fusion.failures_exhausted() {
                return Err(Fatal::RadarFault {
                    radar: idx,
                    failures: fusion.consecutive_failures(),
                });
            }
        }

        match self.link.poll_exit() {
            Ok(Some(exit)) => return Err(Fatal::ActuatorExited { code: exit.code }),
            Ok(None) => {}
            Err(e) => return Err(Fatal::ActuatorLink(format!("liveness check: {e}"))),
        }

        if r1 == FrameResult::PollFailed || r2 == FrameResult::PollFailed {
            return Ok(Tick::Skipped);
        }

        let now = self.clock.now();
        let cmd_allowed = self.lockout_until.is_some_and(|until| now >= until);
        let both_present = self.radar_1.reliable_present() && self.radar_2.reliable_present();
        let stuck = self.radar_1.is_stuck() || self.radar_2.is_stuck();

        let command = if !cmd_allowed {
            None
        } else if !self.glass_on && both_present && !(self.cfg.inhibit_on_when_stuck && stuck) {
            Some(Command::On)
        } else if self.glass_on && !both_present {
            Some(Command::Off)
        } else {
            None
        };

        if let Some(cmd) = command {
            self.link
                .send(cmd)
                .map_err(|e| Fatal::ActuatorLink(format!("send {cmd}: {e}")))?;
            self.glass_on = cmd == Command::On;
            self.lockout_until = now.checked_add(self.cfg.state_delay);
            info!(%cmd, "command sent");
        }

        let decision = Decision {
            glass_on: self.glass_on,
            cmd_allowed,
            both_present,
            stuck,
            command,
        };
        self.emit(&decision);
        Ok(Tick::Decided(decision))
    }

    fn emit(&mut self, decision: &Decision) {
        let record = TelemetryRecord::new(
            &self.radar_1.snapshot(),
            &self.radar_2.snapshot(),
            decision,
        );
        info!(target: "glass::telemetry", "{}", record.human_line());
        if let Some(sink) = self.telemetry.as_mut() {
            if let Err(e) = sink.record(&record) {
                warn!(error = %e, "telemetry row dropped");
            }
        }
    }

    /// Tick until something fatal happens.
    pub fn run(&mut self) -> Fatal {
        info!("orchestrator started");
        loop {
            if let Err(fatal) = self.tick() {
                error!(error = %fatal, "orchestrator stopping");
                return fatal;
            }
        }
    }

    pub fn glass_on(&self) -> bool {
        self.glass_on
    }

    pub fn radar_1(&self) -> &RadarFusion<S, C> {
        &self.radar_1
    }

    pub fn radar_2(&self) -> &RadarFusion<S, C> {
        &self.radar_2
    }

    pub fn link(&self) -> &A {
        &self.link
    }

    pub fn into_link(self) -> A {
        self.link
    }
}
