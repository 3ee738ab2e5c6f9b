//! Runtime configuration handed to each component's constructor.
//!
//! These are separate from the TOML-deserialized structs in `glass_config`;
//! see `conversions` for the mapping. Once built they are never mutated:
//! a reload builds a new value and swaps it in whole.

use std::time::Duration;

/// Radar fusion parameters (one per physical radar).
#[derive(Debug, Clone, PartialEq)]
pub struct FusionCfg {
    /// Max change of the reliable distance per tick (mm).
    pub distance_delta: f64,
    /// Upper bound of the reliable distance; also the "absent" reading.
    pub distance_max: f64,
    /// Presence threshold on the reliable distance (strict).
    pub distance_thr: f64,
    pub angle_delta: f64,
    pub angle_abs_max: f64,
    pub angle_abs_thr: f64,
    /// How long a presence verdict must hold before it is published.
    pub toggle_delay: Duration,
    /// Consecutive failed polls after which the radar is considered dead.
    pub max_frame_failures: u32,
    /// Repeated-identity frames needed to flag the sensor as stuck.
    pub stuck_frames: u32,
    /// Fresh frames needed to clear the stuck flag.
    pub unstuck_frames: u32,
}

impl Default for FusionCfg {
    fn default() -> Self {
        Self {
            distance_delta: 100.0,
            distance_max: 4000.0,
            distance_thr: 1500.0,
            angle_delta: 5.0,
            angle_abs_max: 90.0,
            angle_abs_thr: 30.0,
            toggle_delay: Duration::from_secs(1),
            max_frame_failures: 10,
            stuck_frames: 20,
            unstuck_frames: 3,
        }
    }
}

/// Three-band ramp profile: small steps at both ends, a larger one between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampTable {
    pub l1: f64,
    pub l2: f64,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

impl RampTable {
    /// Increment applied when moving toward ON from `duty`.
    #[inline]
    pub fn delta_up(&self, duty: f64) -> f64 {
        if duty < self.l1 {
            self.d1
        } else if duty < self.l2 {
            self.d2
        } else {
            self.d3
        }
    }

    /// Decrement applied when moving toward OFF from `duty`.
    #[inline]
    pub fn delta_down(&self, duty: f64) -> f64 {
        if duty > self.l1 {
            self.d1
        } else if duty > self.l2 {
            self.d2
        } else {
            self.d3
        }
    }
}

/// Drive waveform and ramp parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorCfg {
    pub freq_hz: u32,
    /// Duty cycle (percent) of the OFF extreme.
    pub dc_off: f64,
    /// Duty cycle (percent) of the ON extreme.
    pub dc_on: f64,
    pub enable_pin: u8,
    pub a_pin: u8,
    pub b_pin: u8,
    pub listener_backoff: Duration,
    pub ramp_up: RampTable,
    pub ramp_down: RampTable,
}

impl ActuatorCfg {
    /// Half of one drive period; each line is driven in its own half.
    pub fn half_period(&self) -> Duration {
        crate::util::half_period(self.freq_hz)
    }
}

impl Default for ActuatorCfg {
    fn default() -> Self {
        Self {
            freq_hz: 111,
            dc_off: 0.0,
            dc_on: 100.0,
            enable_pin: 16,
            a_pin: 5,
            b_pin: 6,
            listener_backoff: Duration::from_millis(500),
            ramp_up: RampTable {
                l1: 30.0,
                l2: 80.0,
                d1: 2.0,
                d2: 5.0,
                d3: 1.0,
            },
            ramp_down: RampTable {
                l1: 80.0,
                l2: 30.0,
                d1: 1.0,
                d2: 5.0,
                d3: 2.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorCfg {
    /// Minimum time between two commands.
    pub state_delay: Duration,
    pub inhibit_on_when_stuck: bool,
}

impl Default for OrchestratorCfg {
    fn default() -> Self {
        Self {
            state_delay: Duration::from_secs(3),
            inhibit_on_when_stuck: false,
        }
    }
}
