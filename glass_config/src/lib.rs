#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the smart-glass controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `ConfigWatch` tracks the file's modification time, the only signal used
//!   for invalidation (orchestrator exits) and live reload (actuator).
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

mod watch;

pub use watch::ConfigWatch;

/// Per-radar fusion and device settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RadarCfg {
    /// Device identifier handed to the frame source (e.g. "/dev/ttyAMA0").
    pub device: String,
    /// Consecutive failed polls tolerated before the orchestrator gives up.
    pub max_frame_failures: u32,
    /// Max change of the reliable distance per tick (mm).
    pub distance_delta: f64,
    pub distance_max: f64,
    /// Presence requires reliable distance strictly below this (mm).
    pub distance_thr: f64,
    /// Max change of the reliable |angle| per tick (degrees).
    pub angle_delta: f64,
    pub angle_abs_max: f64,
    pub angle_abs_thr: f64,
    /// Presence verdict must hold this long before it becomes visible.
    #[serde(alias = "toggle_delay")]
    pub toggle_delay_s: f64,
    /// Consecutive repeated frames that flag the sensor as stuck.
    #[serde(default = "default_stuck_frames")]
    pub stuck_frames: u32,
    /// Fresh frames needed to clear the stuck flag.
    #[serde(default = "default_unstuck_frames")]
    pub unstuck_frames: u32,
    #[serde(default)]
    pub bluetooth: bool,
    #[serde(default)]
    pub multi_tracking: bool,
}

/// Upper bound for `toggle_delay_s` and `state_delay_s` (one day).
pub const MAX_DELAY_S: f64 = 86_400.0;

fn default_stuck_frames() -> u32 {
    20
}

fn default_unstuck_frames() -> u32 {
    3
}

/// One three-band ramp table.
///
/// Up: `duty < l1 -> d1`, `duty < l2 -> d2`, else `d3`.
/// Down: `duty > l1 -> d1`, `duty > l2 -> d2`, else `d3`.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RampBands {
    pub l1: f64,
    pub l2: f64,
    pub d1: f64,
    pub d2: f64,
    pub d3: f64,
}

impl RampBands {
    fn default_up() -> Self {
        Self {
            l1: 30.0,
            l2: 80.0,
            d1: 2.0,
            d2: 5.0,
            d3: 1.0,
        }
    }

    fn default_down() -> Self {
        Self {
            l1: 80.0,
            l2: 30.0,
            d1: 1.0,
            d2: 5.0,
            d3: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActuatorCfg {
    /// Drive frequency; each period has two half-periods, one per line.
    pub freq_hz: u32,
    pub dc_off: f64,
    pub dc_on: f64,
    pub enable_pin: u8,
    pub a_pin: u8,
    pub b_pin: u8,
    /// Listener back-off while a command is still pending (ms).
    pub listener_backoff_ms: u64,
    pub ramp_up: RampBands,
    pub ramp_down: RampBands,
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
            listener_backoff_ms: 500,
            ramp_up: RampBands::default_up(),
            ramp_down: RampBands::default_down(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorCfg {
    /// Minimum dwell between two actuator commands (seconds).
    #[serde(alias = "delay_state")]
    pub state_delay_s: f64,
    /// Refuse to switch ON while either radar is flagged stuck.
    pub inhibit_on_when_stuck: bool,
}

impl Default for OrchestratorCfg {
    fn default() -> Self {
        Self {
            state_delay_s: 3.0,
            inhibit_on_when_stuck: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryCfg {
    pub enabled: bool,
    /// Directory receiving one `telemetry-<unix secs>.csv` per session.
    pub dir: PathBuf,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub radar_1: RadarCfg,
    pub radar_2: RadarCfg,
    #[serde(default)]
    pub actuator: ActuatorCfg,
    #[serde(default)]
    pub orchestrator: OrchestratorCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub telemetry: TelemetryCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate the config file, returning it together with
/// its modification time at the moment it was read.
pub fn load_path(path: &Path) -> eyre::Result<(Config, Option<SystemTime>)> {
    let mtime = watch::modified(path);
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok((cfg, mtime))
}

impl RadarCfg {
    fn validate(&self, name: &str) -> eyre::Result<()> {
        if self.device.trim().is_empty() {
            eyre::bail!("{name}.device must not be empty");
        }
        if self.max_frame_failures == 0 {
            eyre::bail!("{name}.max_frame_failures must be >= 1");
        }
        for (key, v) in [
            ("distance_delta", self.distance_delta),
            ("distance_max", self.distance_max),
            ("distance_thr", self.distance_thr),
            ("angle_delta", self.angle_delta),
            ("angle_abs_max", self.angle_abs_max),
            ("angle_abs_thr", self.angle_abs_thr),
        ] {
            if !(v.is_finite() && v > 0.0) {
                eyre::bail!("{name}.{key} must be > 0");
            }
        }
        if self.distance_thr > self.distance_max {
            eyre::bail!("{name}.distance_thr must be <= distance_max");
        }
        if self.angle_abs_thr > self.angle_abs_max {
            eyre::bail!("{name}.angle_abs_thr must be <= angle_abs_max");
        }
        if !(0.0..=MAX_DELAY_S).contains(&self.toggle_delay_s) {
            eyre::bail!("{name}.toggle_delay_s must be in [0, {MAX_DELAY_S}]");
        }
        if self.stuck_frames == 0 {
            eyre::bail!("{name}.stuck_frames must be >= 1");
        }
        if self.unstuck_frames == 0 {
            eyre::bail!("{name}.unstuck_frames must be >= 1");
        }
        Ok(())
    }
}

impl ActuatorCfg {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.freq_hz == 0 {
            eyre::bail!("actuator.freq_hz must be > 0");
        }
        if self.listener_backoff_ms == 0 {
            eyre::bail!("actuator.listener_backoff_ms must be >= 1");
        }
        if !(0.0..=100.0).contains(&self.dc_off) || !(0.0..=100.0).contains(&self.dc_on) {
            eyre::bail!("actuator.dc_off and actuator.dc_on must be in [0, 100]");
        }
        if self.dc_off >= self.dc_on {
            eyre::bail!("actuator.dc_off must be < actuator.dc_on");
        }
        for (table, bands) in [("ramp_up", &self.ramp_up), ("ramp_down", &self.ramp_down)] {
            for (key, d) in [("d1", bands.d1), ("d2", bands.d2), ("d3", bands.d3)] {
                if !(d.is_finite() && d > 0.0) {
                    eyre::bail!("actuator.{table}.{key} must be > 0");
                }
            }
            if !(bands.l1.is_finite() && bands.l2.is_finite()) {
                eyre::bail!("actuator.{table} band limits must be finite");
            }
        }
        if self.ramp_up.l1 > self.ramp_up.l2 {
            eyre::bail!("actuator.ramp_up.l1 must be <= ramp_up.l2");
        }
        if self.ramp_down.l1 < self.ramp_down.l2 {
            eyre::bail!("actuator.ramp_down.l1 must be >= ramp_down.l2");
        }
        let pins = [self.enable_pin, self.a_pin, self.b_pin];
        if pins[0] == pins[1] || pins[0] == pins[2] || pins[1] == pins[2] {
            eyre::bail!("actuator pins (enable_pin, a_pin, b_pin) must be distinct");
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        self.radar_1.validate("radar_1")?;
        self.radar_2.validate("radar_2")?;
        self.actuator.validate()?;

        if !(0.0..=MAX_DELAY_S).contains(&self.orchestrator.state_delay_s) {
            eyre::bail!("orchestrator.state_delay_s must be in [0, {MAX_DELAY_S}]");
        }

        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
