//! `glass self-check`: validate the config and the drive backend, print a summary.

use std::path::Path;

use glass_config::Config;
use glass_core::{ActuatorCfg, FusionCfg, OrchestratorCfg};

pub fn summary(path: &Path, cfg: &Config) -> String {
    let mut out = format!("config OK: {}\n", path.display());
    for (idx, radar) in [(1, &cfg.radar_1), (2, &cfg.radar_2)] {
        let f = FusionCfg::from(radar);
        out.push_str(&format!(
            "radar_{idx}: device={} present below {} mm and {} deg, toggle delay {:?}, fault after {} failed polls\n",
            radar.device, f.distance_thr, f.angle_abs_thr, f.toggle_delay, f.max_frame_failures
        ));
    }
    let a = ActuatorCfg::from(&cfg.actuator);
    out.push_str(&format!(
        "actuator: {} Hz (half period {:?}), duty {}..{} %, pins enable={} a={} b={}\n",
        a.freq_hz,
        a.half_period(),
        a.dc_off,
        a.dc_on,
        a.enable_pin,
        a.a_pin,
        a.b_pin
    ));
    let o = OrchestratorCfg::from(&cfg.orchestrator);
    out.push_str(&format!(
        "orchestrator: state delay {:?}, inhibit ON when stuck: {}\n",
        o.state_delay, o.inhibit_on_when_stuck
    ));
    if cfg.telemetry.enabled {
        out.push_str(&format!("telemetry: {}\n", cfg.telemetry.dir.display()));
    } else {
        out.push_str("telemetry: disabled\n");
    }
    out.push_str(if cfg!(all(feature = "hardware", target_os = "linux")) {
        "backend: hardware drive lines, simulated radars\n"
    } else {
        "backend: simulated\n"
    });
    out
}
