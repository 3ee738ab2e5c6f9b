use glass_config::load_toml;
use rstest::rstest;

fn base() -> String {
    r#"
[radar_1]
device = "/dev/ttyAMA0"
max_frame_failures = 10
distance_delta = 100.0
distance_max = 4000.0
distance_thr = 1500.0
angle_delta = 5.0
angle_abs_max = 90.0
angle_abs_thr = 30.0
toggle_delay_s = 1.0

[radar_2]
device = "/dev/ttyAMA1"
max_frame_failures = 10
distance_delta = 100.0
distance_max = 4000.0
distance_thr = 1500.0
angle_delta = 5.0
angle_abs_max = 90.0
angle_abs_thr = 30.0
toggle_delay_s = 1.0

[actuator]
freq_hz = 111
dc_off = 0.0
dc_on = 100.0

[actuator.ramp_up]
l1 = 30.0
l2 = 80.0
d1 = 2.0
d2 = 5.0
d3 = 1.0

[actuator.ramp_down]
l1 = 80.0
l2 = 30.0
d1 = 1.0
d2 = 5.0
d3 = 2.0

[orchestrator]
state_delay_s = 3.0
"#
    .to_string()
}

#[test]
fn accepts_reference_config() {
    let cfg = load_toml(&base()).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.radar_1.device, "/dev/ttyAMA0");
    assert_eq!(cfg.actuator.ramp_down.d3, 2.0);
}

#[rstest]
#[case("max_frame_failures = 10", "max_frame_failures = 0", "radar_1.max_frame_failures must be >= 1")]
#[case("distance_delta = 100.0", "distance_delta = 0.0", "radar_1.distance_delta must be > 0")]
#[case("distance_thr = 1500.0", "distance_thr = 5000.0", "radar_1.distance_thr must be <= distance_max")]
#[case("angle_abs_thr = 30.0", "angle_abs_thr = 95.0", "radar_1.angle_abs_thr must be <= angle_abs_max")]
#[case("toggle_delay_s = 1.0", "toggle_delay_s = -1.0", "radar_1.toggle_delay_s must be in [0, 86400]")]
#[case("toggle_delay_s = 1.0", "toggle_delay_s = 1e20", "radar_1.toggle_delay_s must be in [0, 86400]")]
#[case("toggle_delay_s = 1.0", "toggle_delay_s = nan", "radar_1.toggle_delay_s must be in [0, 86400]")]
#[case("freq_hz = 111", "freq_hz = 0", "actuator.freq_hz must be > 0")]
#[case("freq_hz = 111", "freq_hz = 111\nlistener_backoff_ms = 0", "actuator.listener_backoff_ms must be >= 1")]
#[case("dc_on = 100.0", "dc_on = 0.0", "dc_off must be < actuator.dc_on")]
#[case("dc_on = 100.0", "dc_on = 120.0", "must be in [0, 100]")]
#[case("l1 = 30.0\nl2 = 80.0", "l1 = 90.0\nl2 = 80.0", "ramp_up.l1 must be <= ramp_up.l2")]
#[case("l1 = 80.0\nl2 = 30.0", "l1 = 20.0\nl2 = 30.0", "ramp_down.l1 must be >= ramp_down.l2")]
#[case("d1 = 2.0", "d1 = 0.0", "actuator.ramp_up.d1 must be > 0")]
#[case("state_delay_s = 3.0", "state_delay_s = -0.5", "orchestrator.state_delay_s must be in [0, 86400]")]
#[case("state_delay_s = 3.0", "state_delay_s = 1e19", "orchestrator.state_delay_s must be in [0, 86400]")]
#[case("state_delay_s = 3.0", "state_delay_s = 86400.5", "orchestrator.state_delay_s must be in [0, 86400]")]
fn rejects_out_of_range_values(#[case] from: &str, #[case] to: &str, #[case] expect: &str) {
    // replace only the first occurrence so radar_1 / ramp_up are the ones broken
    let toml = base().replacen(from, to, 1);
    assert_ne!(toml, base(), "fixture did not contain {from:?}");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains(expect), "got: {err}");
}

#[test]
fn rejects_shared_drive_pins() {
    let toml = base().replace("freq_hz = 111", "freq_hz = 111\na_pin = 6\nb_pin = 6");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(format!("{err}").contains("must be distinct"));
}

#[test]
fn rejects_unknown_rotation() {
    let toml = format!("{}\n[logging]\nrotation = \"weekly\"\n", base());
    let cfg = load_toml(&toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_radar_section_is_a_parse_error() {
    let toml = base().replace("[radar_2]", "[radar_3]");
    assert!(load_toml(&toml).is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let cfg = load_toml(include_str!("../../etc/glass_config.toml")).expect("parse sample");
    cfg.validate().expect("validate sample");
    assert_eq!(cfg.radar_2.stuck_frames, 20);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}
