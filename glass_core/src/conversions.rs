//! `From` implementations bridging `glass_config` types to `glass_core` types.

use crate::config::{ActuatorCfg, FusionCfg, OrchestratorCfg, RampTable};
use crate::util::secs_to_duration;
use std::time::Duration;

// ── FusionCfg ────────────────────────────────────────────────────────────────

impl From<&glass_config::RadarCfg> for FusionCfg {
    fn from(c: &glass_config::RadarCfg) -> Self {
        Self {
            distance_delta: c.distance_delta,
            distance_max: c.distance_max,
            distance_thr: c.distance_thr,
            angle_delta: c.angle_delta,
            angle_abs_max: c.angle_abs_max,
            angle_abs_thr: c.angle_abs_thr,
            toggle_delay: secs_to_duration(c.toggle_delay_s),
            max_frame_failures: c.max_frame_failures,
            stuck_frames: c.stuck_frames,
            unstuck_frames: c.unstuck_frames,
        }
    }
}

// ── ActuatorCfg ──────────────────────────────────────────────────────────────

impl From<&glass_config::RampBands> for RampTable {
    fn from(b: &glass_config::RampBands) -> Self {
        Self {
            l1: b.l1,
            l2: b.l2,
            d1: b.d1,
            d2: b.d2,
            d3: b.d3,
        }
    }
}

impl From<&glass_config::ActuatorCfg> for ActuatorCfg {
    fn from(c: &glass_config::ActuatorCfg) -> Self {
        Self {
            freq_hz: c.freq_hz,
            dc_off: c.dc_off,
            dc_on: c.dc_on,
            enable_pin: c.enable_pin,
            a_pin: c.a_pin,
            b_pin: c.b_pin,
            listener_backoff: Duration::from_millis(c.listener_backoff_ms),
            ramp_up: (&c.ramp_up).into(),
            ramp_down: (&c.ramp_down).into(),
        }
    }
}

// ── OrchestratorCfg ──────────────────────────────────────────────────────────

impl From<&glass_config::OrchestratorCfg> for OrchestratorCfg {
    fn from(c: &glass_config::OrchestratorCfg) -> Self {
        Self {
            state_delay: secs_to_duration(c.state_delay_s),
            inhibit_on_when_stuck: c.inhibit_on_when_stuck,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_seconds_survive_conversion() {
        let c = glass_config::OrchestratorCfg {
            state_delay_s: 2.5,
            inhibit_on_when_stuck: true,
        };
        let o: OrchestratorCfg = (&c).into();
        assert_eq!(o.state_delay, Duration::from_millis(2500));
        assert!(o.inhibit_on_when_stuck);
    }

    #[test]
    fn actuator_defaults_agree_across_crates() {
        let from_toml: ActuatorCfg = (&glass_config::ActuatorCfg::default()).into();
        assert_eq!(from_toml, ActuatorCfg::default());
    }
}
