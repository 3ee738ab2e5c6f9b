//! Actuator process main loop.
//!
//! Every iteration first checks for a config reload (idle boundary only),
//! then either executes the pending command as a full ramp or drives one
//! idle cycle at the current duty.

use glass_config::ConfigWatch;
use glass_traits::OutputLines;
use glass_traits::clock::Clock;
use tracing::{info, warn};

use crate::command::{Command, Mailbox, Slot};
use crate::config::ActuatorCfg;
use crate::error::Result;
use crate::ramp::{ActuatorRamp, RampReport};

/// Source of replacement actuator configs.
pub trait ReloadSource {
    /// A new config when the backing source changed and parsed cleanly.
    fn poll(&mut self) -> Option<ActuatorCfg>;
}

/// Reloads the `[actuator]` table when the config file's mtime changes.
/// A file that fails to parse or validate is ignored until it changes again.
pub struct FileReload {
    watch: ConfigWatch,
}

impl FileReload {
    pub fn new(watch: ConfigWatch) -> Self {
        Self { watch }
    }
}

impl ReloadSource for FileReload {
    fn poll(&mut self) -> Option<ActuatorCfg> {
        if !self.watch.take_change() {
            return None;
        }
        match glass_config::load_path(self.watch.path()) {
            Ok((cfg, _)) => Some((&cfg.actuator).into()),
            Err(e) => {
                warn!(error = %e, "config changed but could not be loaded; keeping current values");
                None
            }
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Idle,
    Ramped(Command, RampReport),
    /// Command stream ended; the glass has been ramped off and the lines parked.
    Closed,
}

pub struct ActuatorLoop<L: OutputLines, C: Clock> {
    ramp: ActuatorRamp<L, C>,
    mailbox: Mailbox,
    reload: Option<Box<dyn ReloadSource>>,
}

impl<L: OutputLines, C: Clock> ActuatorLoop<L, C> {
    pub fn new(ramp: ActuatorRamp<L, C>, mailbox: Mailbox) -> Self {
        Self {
            ramp,
            mailbox,
            reload: None,
        }
    }

    pub fn with_reload(mut self, reload: impl ReloadSource + 'static) -> Self {
        self.reload = Some(Box::new(reload));
        self
    }

    pub fn step(&mut self) -> Result<LoopEvent> {
        if let Some(cfg) = self.reload.as_mut().and_then(|r| r.poll()) {
            self.ramp.reload(cfg)?;
        }

        let event = match self.mailbox.peek() {
            Slot::Empty => {
                self.ramp.cycle()?;
                LoopEvent::Idle
            }
            Slot::Pending(cmd) => {
                let report = match cmd {
                    Command::On => self.ramp.turn_on()?,
                    Command::Off => self.ramp.turn_off()?,
                };
                self.mailbox.complete();
                LoopEvent::Ramped(cmd, report)
            }
            Slot::Closed => {
                self.ramp.turn_off()?;
                self.ramp.shutdown()?;
                LoopEvent::Closed
            }
        };
        self.ramp.check_bounds()?;
        Ok(event)
    }

    /// Run until the command stream closes. Only returns early on a drive error.
    pub fn run(&mut self) -> Result<()> {
        info!(duty = self.ramp.duty(), "actuator loop started");
        loop {
            if self.step()? == LoopEvent::Closed {
                return Ok(());
            }
        }
    }

    pub fn ramp(&self) -> &ActuatorRamp<L, C> {
        &self.ramp
    }
}
