//! Per-radar signal fusion.
//!
//! Turns noisy, intermittent frames into a debounced presence flag:
//!
//! 1. nearest target wins (ties: first in the frame);
//! 2. stuck detection on the target's identity (a frozen link repeats the
//!    same tuple); while stuck the frame is ignored;
//! 3. bounded-slew filter on distance and |angle|, forced toward the
//!    maximum when nothing usable was seen;
//! 4. presence threshold, then a toggle delay before the verdict is published.
//!
//! Pacing comes from the frame source: `process()` blocks in `poll_frame`.

use std::time::Instant;

use glass_traits::FrameSource;
use glass_traits::clock::Clock;
use tracing::{debug, info, warn};

use crate::config::FusionCfg;
use crate::util::rate_limited;

/// Outcome of one `process()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// A frame was read (possibly with no targets).
    Polled,
    /// The source could not deliver a frame.
    PollFailed,
}

/// Nearest target of the last frame, as distance and absolute angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub distance: f64,
    pub angle_abs: f64,
}

/// Copy of everything telemetry needs from one radar after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarSnapshot {
    pub pending_bytes: usize,
    pub stuck: bool,
    pub raw: Option<RawReading>,
    pub reliable_distance: f64,
    pub reliable_angle_abs: f64,
    pub raw_present: bool,
    pub reliable_present: bool,
    pub consecutive_failures: u32,
}

pub struct RadarFusion<S: FrameSource, C: Clock> {
    source: S,
    clock: C,
    cfg: FusionCfg,

    raw_target: Option<S::Target>,
    raw: Option<RawReading>,

    reliable_distance: f64,
    reliable_angle_abs: f64,

    stuck: bool,
    stuck_run_count: u32,

    raw_present: bool,
    toggle_instant: Instant,
    reliable_present: bool,

    consecutive_failures: u32,
}

impl<S: FrameSource, C: Clock> RadarFusion<S, C> {
    /// Start cold: reliable values at their maxima, nobody present.
    pub fn new(source: S, cfg: FusionCfg, clock: C) -> Self {
        let now = clock.now();
        Self {
            source,
            clock,
            reliable_distance: cfg.distance_max,
            reliable_angle_abs: cfg.angle_abs_max,
            cfg,
            raw_target: None,
            raw: None,
            stuck: false,
            stuck_run_count: 0,
            raw_present: false,
            toggle_instant: now,
            reliable_present: false,
            consecutive_failures: 0,
        }
    }

    /// Poll one frame and advance the filter by one tick.
    ///
    /// A failed poll is filtered like an empty frame so the reliable
    /// readings keep decaying toward "absent".
    pub fn process(&mut self) -> FrameResult {
        let now = self.clock.now();

        let (result, frame) = match self.source.poll_frame() {
            Ok(frame) => {
                self.consecutive_failures = 0;
                (FrameResult::Polled, frame)
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "radar poll failed"
                );
                (FrameResult::PollFailed, Vec::new())
            }
        };

        let previous = self.raw_target.take();
        let nearest = self.nearest(frame);
        let repeated = matches!((&nearest, &previous), (Some((t, _)), Some(p)) if t == p);
        self.update_stuck(nearest.is_some(), repeated);

        let (target, reading) = nearest.unzip();
        self.raw_target = target;
        self.raw = reading;

        let (distance_in, angle_in) = match self.raw {
            Some(r) if !self.stuck => (r.distance, r.angle_abs),
            _ => (self.cfg.distance_max, self.cfg.angle_abs_max),
        };
        self.reliable_distance = rate_limited(
            self.reliable_distance,
            distance_in,
            self.cfg.distance_delta,
            self.cfg.distance_max,
        );
        self.reliable_angle_abs = rate_limited(
            self.reliable_angle_abs,
            angle_in,
            self.cfg.angle_delta,
            self.cfg.angle_abs_max,
        );

        self.update_presence(now);
        result
    }

    fn nearest(&self, frame: Vec<S::Target>) -> Option<(S::Target, RawReading)> {
        let mut best: Option<(S::Target, RawReading)> = None;
        for target in frame {
            let distance = self.source.distance(&target);
            if !distance.is_finite() {
                continue;
            }
            // strict comparison keeps the first of equally near targets
            if best.as_ref().is_none_or(|(_, b)| distance < b.distance) {
                let angle_abs = self.source.angle(&target).abs();
                best = Some((
                    target,
                    RawReading {
                        distance,
                        angle_abs,
                    },
                ));
            }
        }
        best
    }

    fn update_stuck(&mut self, present: bool, repeated: bool) {
        if self.stuck {
            // anything but the frozen identity counts toward recovery
            if present && repeated {
                self.stuck_run_count = 0;
            } else {
                self.stuck_run_count += 1;
            }
            if self.stuck_run_count >= self.cfg.unstuck_frames {
                self.stuck = false;
                self.stuck_run_count = 0;
                info!("radar recovered from stuck state");
            }
        } else {
            if present && repeated {
                self.stuck_run_count += 1;
            } else {
                self.stuck_run_count = 0;
            }
            if self.stuck_run_count >= self.cfg.stuck_frames {
                self.stuck = true;
                self.stuck_run_count = 0;
                warn!(
                    frames = self.cfg.stuck_frames,
                    "radar repeats the same target; treating it as stuck"
                );
            }
        }
    }

    fn update_presence(&mut self, now: Instant) {
        let raw_present = self.reliable_distance < self.cfg.distance_thr
            && self.reliable_angle_abs < self.cfg.angle_abs_thr;
        if raw_present != self.raw_present {
            self.raw_present = raw_present;
            self.toggle_instant = now;
        }
        if now.saturating_duration_since(self.toggle_instant) > self.cfg.toggle_delay
            && self.reliable_present != self.raw_present
        {
            self.reliable_present = self.raw_present;
            debug!(present = self.reliable_present, "presence changed");
        }
    }

    pub fn reliable_present(&self) -> bool {
        self.reliable_present
    }

    pub fn raw_present(&self) -> bool {
        self.raw_present
    }

    pub fn reliable_distance(&self) -> f64 {
        self.reliable_distance
    }

    pub fn reliable_angle_abs(&self) -> f64 {
        self.reliable_angle_abs
    }

    pub fn raw(&self) -> Option<RawReading> {
        self.raw
    }

    pub fn is_stuck(&self) -> bool {
        self.stuck
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// True once the failure counter has reached the configured maximum.
    pub fn failures_exhausted(&self) -> bool {
        self.consecutive_failures >= self.cfg.max_frame_failures
    }

    pub fn cfg(&self) -> &FusionCfg {
        &self.cfg
    }

    pub fn snapshot(&self) -> RadarSnapshot {
        RadarSnapshot {
            pending_bytes: self.source.pending_bytes(),
            stuck: self.stuck,
            raw: self.raw,
            reliable_distance: self.reliable_distance,
            reliable_angle_abs: self.reliable_angle_abs,
            raw_present: self.raw_present,
            reliable_present: self.reliable_present,
            consecutive_failures: self.consecutive_failures,
        }
    }
}
