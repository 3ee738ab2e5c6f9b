pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use glass_traits::clock::Clock;
use glass_traits::{BoxError, FrameSource, Level, OutputLines, RawTarget};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::HwError;

/// Simulated presence radar: one visitor walking toward the panel and away
/// again on a triangle path, paced at the radar's frame rate.
pub struct SimulatedRadar<C: Clock> {
    clock: C,
    frame_period: Duration,
    near_mm: f64,
    far_mm: f64,
    walk_frames: u64,
    frame: u64,
    failing: bool,
}

impl<C: Clock> SimulatedRadar<C> {
    pub fn new(clock: C, frame_period: Duration) -> Self {
        Self {
            clock,
            frame_period,
            near_mm: 300.0,
            far_mm: 4000.0,
            walk_frames: 200,
            frame: 0,
            failing: false,
        }
    }

    /// Walk between `near_mm` and `far_mm`; one full round trip takes `frames` polls.
    pub fn with_walk(mut self, near_mm: f64, far_mm: f64, frames: u64) -> Self {
        self.near_mm = near_mm;
        self.far_mm = far_mm;
        self.walk_frames = frames.max(2);
        self
    }

    /// Every poll fails, as a disconnected UART would.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn visitor_distance(&self) -> f64 {
        let half = self.walk_frames as f64 / 2.0;
        let phase = (self.frame % self.walk_frames) as f64;
        // 0 at the far end, 1 at the panel
        let closeness = if phase < half {
            phase / half
        } else {
            (self.walk_frames as f64 - phase) / half
        };
        self.far_mm - (self.far_mm - self.near_mm) * closeness
    }
}

impl<C: Clock> FrameSource for SimulatedRadar<C> {
    type Target = RawTarget;

    fn poll_frame(&mut self) -> Result<Vec<RawTarget>, BoxError> {
        self.clock.sleep(self.frame_period);
        if self.failing {
            return Err(Box::new(HwError::LinkDown));
        }
        let distance = self.visitor_distance();
        // small lateral sway keeps the identity changing frame to frame
        let sway = ((self.frame % 7) as f64 - 3.0) * 2.0;
        self.frame = self.frame.wrapping_add(1);
        let mut target = RawTarget::from_polar(distance, sway);
        target.speed_cm_s = if self.frame % self.walk_frames < self.walk_frames / 2 {
            -40
        } else {
            40
        };
        target.resolution_mm = 320;
        tracing::trace!(distance, sway, "simulated radar frame");
        Ok(vec![target])
    }

    fn distance(&self, target: &RawTarget) -> f64 {
        target.distance_mm()
    }

    fn angle(&self, target: &RawTarget) -> f64 {
        target.angle_deg()
    }
}

/// Simulated drive lines: tracks levels and counts edges.
#[derive(Debug, Default)]
pub struct SimulatedLines {
    levels: HashMap<u8, Level>,
    edges: u64,
}

impl SimulatedLines {
    pub fn new(pins: &[u8]) -> Self {
        Self {
            levels: pins.iter().map(|&p| (p, Level::Low)).collect(),
            edges: 0,
        }
    }

    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Number of level changes observed across all lines.
    pub fn edges(&self) -> u64 {
        self.edges
    }
}

impl OutputLines for SimulatedLines {
    fn set_line(&mut self, pin: u8, level: Level) -> Result<(), BoxError> {
        let Some(current) = self.levels.get_mut(&pin) else {
            return Err(Box::new(HwError::UnknownPin(pin)));
        };
        if *current != level {
            self.edges += 1;
            *current = level;
        }
        Ok(())
    }
}
