//! `glass actuator`: the child process that owns the drive lines.

use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

use eyre::WrapErr;
use glass_config::{Config, ConfigWatch};
use glass_core::command::spawn_listener;
use glass_core::{ActuatorCfg, ActuatorLoop, ActuatorRamp, FileReload, Mailbox};
use glass_traits::OutputLines;
use glass_traits::clock::MonotonicClock;
use tracing::{info, warn};

use crate::rt::{RtOptions, setup_rt_once};

/// Exit right after startup with this code (tests only).
const TEST_EXIT_ENV: &str = "GLASS_TEST_ACTUATOR_EXIT";

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_lines(cfg: &ActuatorCfg) -> eyre::Result<Box<dyn OutputLines>> {
    let pins = [cfg.enable_pin, cfg.a_pin, cfg.b_pin];
    let lines = glass_hardware::gpio::GpioLines::open(&pins)?;
    Ok(Box::new(lines))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_lines(cfg: &ActuatorCfg) -> eyre::Result<Box<dyn OutputLines>> {
    let pins = [cfg.enable_pin, cfg.a_pin, cfg.b_pin];
    info!(?pins, "drive lines: simulated");
    Ok(Box::new(glass_hardware::SimulatedLines::new(&pins)))
}

/// Drive the film until the command stream ends. The glass is ramped off
/// before returning, and the result is always an error: the actuator never
/// outlives its orchestrator.
pub fn run_actuator(
    config_path: &Path,
    cfg: &Config,
    mtime: Option<SystemTime>,
    rt: Option<RtOptions>,
) -> eyre::Result<()> {
    if let Some(opts) = rt {
        setup_rt_once(opts);
    }

    if let Some(code) = std::env::var(TEST_EXIT_ENV)
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
    {
        warn!(code, "exiting on request");
        std::process::exit(code);
    }

    let acfg: ActuatorCfg = (&cfg.actuator).into();
    let backoff = acfg.listener_backoff;
    let lines = open_lines(&acfg)?;
    let ramp = ActuatorRamp::new(lines, acfg, MonotonicClock::new())?;

    let mailbox = Mailbox::new();
    let on_signal = mailbox.clone();
    if let Err(e) = ctrlc::set_handler(move || on_signal.close()) {
        warn!(error = %e, "no signal handler; SIGINT will not ramp the glass off");
    }
    spawn_listener(BufReader::new(std::io::stdin()), mailbox.clone(), backoff)
        .wrap_err("start command listener")?;

    let reload = FileReload::new(ConfigWatch::with_baseline(config_path, mtime));
    let mut actuator = ActuatorLoop::new(ramp, mailbox).with_reload(reload);
    actuator.run()?;

    info!(cycles = actuator.ramp().cycles(), "actuator stopped");
    eyre::bail!("command stream closed; glass switched off")
}
