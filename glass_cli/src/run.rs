//! `glass run`: the orchestrator process.

use std::ffi::OsString;
use std::path::Path;
use std::time::{Duration, SystemTime};

use eyre::WrapErr;
use glass_config::{Config, ConfigWatch, RadarCfg};
use glass_core::{ChildActuator, CsvTelemetry, FusionCfg, Orchestrator, OrchestratorCfg};
use glass_hardware::SimulatedRadar;
use glass_traits::clock::MonotonicClock;
use tracing::{info, warn};

/// Frame period of the simulated radars (the real sensors report at ~10 Hz).
const SIM_FRAME_PERIOD: Duration = Duration::from_millis(100);

/// Comma-separated radar indices whose simulated link is down (tests only).
const SIM_RADAR_FAIL_ENV: &str = "GLASS_TEST_SIM_RADAR_FAIL";

fn sim_radar(idx: u8, cfg: &RadarCfg, clock: MonotonicClock) -> SimulatedRadar<MonotonicClock> {
    info!(
        radar = idx,
        device = %cfg.device,
        bluetooth = cfg.bluetooth,
        multi_tracking = cfg.multi_tracking,
        "radar frame source: simulated visitor walk"
    );
    let radar = SimulatedRadar::new(clock, SIM_FRAME_PERIOD).with_walk(300.0, cfg.distance_max, 200);
    let failing = std::env::var(SIM_RADAR_FAIL_ENV)
        .map(|v| v.split(',').any(|s| s.trim() == idx.to_string()))
        .unwrap_or(false);
    if failing { radar.failing() } else { radar }
}

/// Arguments that make the child read the same config and log the same way.
fn actuator_args(config_path: &Path, json: bool, log_level: Option<&str>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--config".into(), config_path.as_os_str().to_owned()];
    if json {
        args.push("--json".into());
    }
    if let Some(level) = log_level {
        args.push("--log-level".into());
        args.push(level.into());
    }
    args.push("actuator".into());
    args
}

/// Run until a fatal condition. Never returns `Ok`.
pub fn run_orchestrator(
    config_path: &Path,
    cfg: &Config,
    mtime: Option<SystemTime>,
    json: bool,
    log_level: Option<&str>,
) -> eyre::Result<()> {
    let clock = MonotonicClock::new();
    let radars = (
        sim_radar(1, &cfg.radar_1, clock),
        sim_radar(2, &cfg.radar_2, clock),
    );
    let fusion: (FusionCfg, FusionCfg) = ((&cfg.radar_1).into(), (&cfg.radar_2).into());
    let orch_cfg: OrchestratorCfg = (&cfg.orchestrator).into();

    let exe = std::env::current_exe().wrap_err("spawn actuator: cannot locate own executable")?;
    let link = ChildActuator::spawn(&exe, actuator_args(config_path, json, log_level))
        .wrap_err("spawn actuator")?;

    let mut orch = Orchestrator::new(radars, fusion, link, orch_cfg, clock)
        .with_config_watch(ConfigWatch::with_baseline(config_path, mtime));

    if cfg.telemetry.enabled {
        match CsvTelemetry::create_session(&cfg.telemetry.dir) {
            Ok(sink) => {
                info!(path = %sink.path().display(), "telemetry session started");
                orch = orch.with_telemetry(sink);
            }
            Err(e) => warn!(error = %e, "telemetry disabled for this session"),
        }
    }

    let fatal = orch.run();

    // closing stdin asks a live actuator to ramp off before we exit
    match orch.into_link().close_and_wait() {
        Ok(exit) => info!(code = ?exit.code, "actuator stopped"),
        Err(e) => warn!(error = %e, "could not reap actuator"),
    }
    Err(eyre::Report::new(fatal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_gets_config_and_log_flags_before_the_subcommand() {
        let args = actuator_args(Path::new("/etc/glass.toml"), true, Some("debug"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["--config", "/etc/glass.toml", "--json", "--log-level", "debug", "actuator"]
        );
    }
}
