use glass_core::mocks::RecordingLines;
use glass_core::{ActuatorCfg, ActuatorRamp, GlassState, RampTable};
use glass_traits::Level;
use glass_traits::clock::test_clock::TestClock;
use proptest::prelude::*;

fn ramp(cfg: ActuatorCfg) -> (ActuatorRamp<RecordingLines, TestClock>, RecordingLines, TestClock) {
    let lines = RecordingLines::new();
    let clock = TestClock::new();
    let r = ActuatorRamp::new(lines.clone(), cfg, clock.clone()).unwrap();
    lines.clear();
    (r, lines, clock)
}

#[test]
fn default_profile_reaches_full_duty_in_45_steps() {
    let (mut r, _, _) = ramp(ActuatorCfg::default());
    let report = r.turn_on().unwrap();
    // 15 steps of 2, 10 of 5, 20 of 1
    assert_eq!(report.steps, 45);
    assert_eq!(r.duty(), 100.0);
    assert_eq!(r.state(), GlassState::On);
    assert_eq!(r.cycles(), 45);

    // a second ON is a no-op
    assert_eq!(r.turn_on().unwrap().steps, 0);
}

#[test]
fn default_profile_ramps_back_down_to_zero() {
    let (mut r, _, _) = ramp(ActuatorCfg::default());
    r.turn_on().unwrap();
    let report = r.turn_off().unwrap();
    assert_eq!(report.steps, 45);
    assert_eq!(r.duty(), 0.0);
    assert_eq!(r.state(), GlassState::Off);
}

#[test]
fn ramp_is_reproducible() {
    let trace = || {
        let (mut r, _, _) = ramp(ActuatorCfg::default());
        let mut duties = Vec::new();
        while r.duty() < 100.0 {
            duties.push(r.step_up());
        }
        duties
    };
    assert_eq!(trace(), trace());
}

#[test]
fn ramp_takes_one_drive_period_per_step() {
    let cfg = ActuatorCfg::default();
    let period = cfg.half_period() * 2;
    let (mut r, _, clock) = ramp(cfg);
    let report = r.turn_on().unwrap();
    assert_eq!(report.took, period * 45);
    assert_eq!(clock.total_slept(), period * 45);
}

#[test]
fn one_cycle_pulses_a_then_b() {
    let mut cfg = ActuatorCfg::default();
    cfg.dc_off = 50.0;
    let half = cfg.half_period();
    let (mut r, lines, clock) = ramp(cfg);
    r.cycle().unwrap();
    assert_eq!(
        lines.calls(),
        vec![(5, Level::High), (5, Level::Low), (6, Level::High), (6, Level::Low)]
    );
    assert_eq!(clock.total_slept(), half * 2);
}

#[test]
fn full_duty_keeps_each_line_high_for_its_whole_half() {
    let mut cfg = ActuatorCfg::default();
    cfg.dc_off = 100.0;
    let (mut r, lines, _) = ramp(cfg);
    for _ in 0..3 {
        r.cycle().unwrap();
    }
    assert_eq!(lines.pulses(5), 3);
    assert_eq!(lines.pulses(6), 3);
    assert_eq!(lines.pulses(16), 0);
}

#[test]
fn shutdown_parks_everything_low() {
    let (mut r, lines, _) = ramp(ActuatorCfg::default());
    r.shutdown().unwrap();
    assert_eq!(
        lines.calls(),
        vec![(5, Level::Low), (6, Level::Low), (16, Level::Low)]
    );
}

fn table() -> impl Strategy<Value = RampTable> {
    (0.0f64..100.0, 0.0f64..100.0, 0.1f64..10.0, 0.1f64..10.0, 0.1f64..10.0)
        .prop_map(|(l1, l2, d1, d2, d3)| RampTable { l1, l2, d1, d2, d3 })
}

proptest! {
    #[test]
    fn duty_stays_in_bounds_and_lands_on_the_extremes(
        dc_off in 0.0f64..40.0,
        dc_on in 60.0f64..=100.0,
        up in table(),
        down in table(),
        moves in prop::collection::vec(any::<bool>(), 0..40),
    ) {
        let mut cfg = ActuatorCfg::default();
        cfg.dc_off = dc_off;
        cfg.dc_on = dc_on;
        cfg.ramp_up = up;
        cfg.ramp_down = down;
        let (mut r, _, _) = ramp(cfg);

        for on in moves {
            if on { r.step_up(); } else { r.step_down(); }
            prop_assert!(r.check_bounds().is_ok());
        }
        r.turn_on().unwrap();
        prop_assert_eq!(r.duty(), dc_on);
        r.turn_off().unwrap();
        prop_assert_eq!(r.duty(), dc_off);
    }
}
