use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use glass_core::mocks::{RecordingLink, ScriptedRadar};
use glass_core::{
    Command, Fatal, FusionCfg, Orchestrator, OrchestratorCfg, TelemetryRecord, TelemetrySink, Tick,
};
use glass_traits::RawTarget;
use glass_traits::clock::Clock;
use glass_traits::clock::test_clock::TestClock;
use proptest::prelude::*;
use rstest::rstest;

const TICK: Duration = Duration::from_millis(100);

/// Fusion that follows the raw frame in one tick and publishes presence on the next.
fn snappy() -> FusionCfg {
    let mut cfg = FusionCfg::default();
    cfg.distance_delta = cfg.distance_max;
    cfg.angle_delta = cfg.angle_abs_max;
    cfg.toggle_delay = Duration::ZERO;
    // walking targets never repeat, but idle frames here do
    cfg.stuck_frames = 1000;
    cfg
}

struct Rig {
    r1: ScriptedRadar,
    r2: ScriptedRadar,
    link: RecordingLink,
    clock: TestClock,
    orch: Orchestrator<ScriptedRadar, RecordingLink, TestClock>,
}

impl Rig {
    fn new(fusion: FusionCfg, cfg: OrchestratorCfg) -> Self {
        let (r1, r2) = (ScriptedRadar::new(), ScriptedRadar::new());
        let link = RecordingLink::new();
        let clock = TestClock::new();
        let orch = Orchestrator::new(
            (r1.clone(), r2.clone()),
            (fusion.clone(), fusion),
            link.clone(),
            cfg,
            clock.clone(),
        );
        Self {
            r1,
            r2,
            link,
            clock,
            orch,
        }
    }

    fn both_near(&self, near: bool) {
        let frame = if near { vec![RawTarget::new(0, 500)] } else { vec![] };
        self.r1.set_idle(frame.clone());
        self.r2.set_idle(frame);
    }

    /// Tick, then let one frame period pass. Returns the tick and the instant it decided at.
    fn tick(&mut self) -> (Result<Tick, Fatal>, Instant) {
        let at = self.clock.now();
        let t = self.orch.tick();
        self.clock.advance(TICK);
        (t, at)
    }

    fn command_of(t: &Result<Tick, Fatal>) -> Option<Command> {
        match t {
            Ok(Tick::Decided(d)) => d.command,
            _ => None,
        }
    }
}

#[test]
fn on_is_immediate_and_off_waits_for_the_lockout() {
    let mut rig = Rig::new(snappy(), OrchestratorCfg::default());
    rig.both_near(true);

    let (t, _) = rig.tick();
    assert_eq!(Rig::command_of(&t), None);
    let (t, on_at) = rig.tick();
    assert_eq!(Rig::command_of(&t), Some(Command::On));
    assert!(rig.orch.glass_on());

    // presence drops one second later
    while rig.clock.now() < on_at + Duration::from_secs(1) {
        let (t, _) = rig.tick();
        assert_eq!(Rig::command_of(&t), None);
    }
    rig.both_near(false);

    let mut off_at = None;
    for _ in 0..50 {
        let (t, at) = rig.tick();
        if Rig::command_of(&t) == Some(Command::Off) {
            off_at = Some(at);
            break;
        }
        if let Ok(Tick::Decided(d)) = t {
            assert!(!d.both_present || at < on_at + Duration::from_millis(1200));
        }
    }
    let off_at = off_at.expect("OFF was never sent");
    assert!(off_at >= on_at + Duration::from_secs(3));
    assert!(off_at < on_at + Duration::from_secs(3) + TICK);
    assert_eq!(rig.link.sent(), vec![Command::On, Command::Off]);
}

#[test]
fn one_radar_alone_does_not_switch_on() {
    let mut rig = Rig::new(snappy(), OrchestratorCfg::default());
    rig.r1.set_idle(vec![RawTarget::new(0, 400)]);
    for _ in 0..20 {
        let (t, _) = rig.tick();
        assert!(t.is_ok());
    }
    assert!(rig.link.sent().is_empty());
}

#[test]
fn actuator_exit_code_ends_the_next_tick() {
    let mut rig = Rig::new(snappy(), OrchestratorCfg::default());
    assert!(rig.tick().0.is_ok());
    rig.link.exit_with(Some(2));
    let (t, _) = rig.tick();
    let fatal = t.unwrap_err();
    assert_eq!(fatal, Fatal::ActuatorExited { code: Some(2) });
    assert!(fatal.to_string().contains("its exit code is 2"));
}

#[test]
fn radar_fault_once_failures_reach_the_limit() {
    let mut fusion = snappy();
    fusion.max_frame_failures = 3;
    let mut rig = Rig::new(fusion, OrchestratorCfg::default());
    for _ in 0..3 {
        rig.r2.push_failure();
    }
    assert_eq!(rig.tick().0, Ok(Tick::Skipped));
    assert_eq!(rig.tick().0, Ok(Tick::Skipped));
    assert_eq!(
        rig.tick().0,
        Err(Fatal::RadarFault {
            radar: 2,
            failures: 3
        })
    );
}

#[test]
fn radar_fault_wins_over_actuator_exit() {
    let mut fusion = snappy();
    fusion.max_frame_failures = 1;
    let mut rig = Rig::new(fusion, OrchestratorCfg::default());
    rig.r1.push_failure();
    rig.link.exit_with(None);
    assert!(matches!(rig.tick().0, Err(Fatal::RadarFault { radar: 1, .. })));
}

#[test]
fn transient_radar_failure_does_not_hide_an_actuator_exit() {
    let mut fusion = snappy();
    fusion.max_frame_failures = 3;
    let mut rig = Rig::new(fusion, OrchestratorCfg::default());
    rig.r1.push_failure();
    rig.link.exit_with(Some(2));
    assert_eq!(rig.tick().0, Err(Fatal::ActuatorExited { code: Some(2) }));
}

#[rstest]
#[case(1e19)] // fits a Duration, overflows Instant
#[case(1e20)] // beyond Duration
fn dwell_past_the_clock_range_never_unlocks(#[case] state_delay_s: f64) {
    let cfg: OrchestratorCfg = (&glass_config::OrchestratorCfg {
        state_delay_s,
        inhibit_on_when_stuck: false,
    })
        .into();
    assert!(cfg.state_delay >= Duration::from_secs(10_000_000_000_000_000_000));
    let mut rig = Rig::new(snappy(), cfg);
    for n in 0..40 {
        rig.both_near((n / 5) % 2 == 0);
        assert!(rig.tick().0.is_ok());
    }
    assert_eq!(rig.link.sent(), vec![Command::On]);
}

#[test]
fn config_change_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glass.toml");
    std::fs::write(&path, "# placeholder\n").unwrap();
    let watch = glass_config::ConfigWatch::new(&path);

    let (r1, r2) = (ScriptedRadar::new(), ScriptedRadar::new());
    let mut orch = Orchestrator::new(
        (r1, r2.clone()),
        (snappy(), snappy()),
        RecordingLink::new(),
        OrchestratorCfg::default(),
        TestClock::new(),
    )
    .with_config_watch(watch);
    assert!(orch.tick().is_ok());

    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(std::time::SystemTime::now() + Duration::from_secs(30))
        .unwrap();
    let polls = r2.polls();
    assert_eq!(orch.tick(), Err(Fatal::ConfigChanged));
    // nothing is polled once the config is stale
    assert_eq!(r2.polls(), polls);
}

/// Radar 1 stares at a frozen target and goes stuck at tick 31 while its
/// slow filter still reports presence; radar 2 only shows up at tick 32.
fn sent_with_radar_1_stuck(inhibit: bool) -> Vec<Command> {
    let mut slow = snappy();
    slow.distance_delta = 100.0;
    slow.angle_delta = 5.0;
    slow.stuck_frames = 30;
    let (r1, r2) = (ScriptedRadar::new(), ScriptedRadar::new());
    r1.set_idle(vec![RawTarget::new(0, 500)]);
    for _ in 0..31 {
        r2.push_frame(vec![]);
    }
    for y in 0..10 {
        r2.push_frame(vec![RawTarget::new(0, 400 + y)]);
    }
    let link = RecordingLink::new();
    let clock = TestClock::new();
    let cfg = OrchestratorCfg {
        inhibit_on_when_stuck: inhibit,
        ..OrchestratorCfg::default()
    };
    let mut orch = Orchestrator::new((r1, r2), (slow, snappy()), link.clone(), cfg, clock.clone());
    for n in 1..=35 {
        orch.tick().unwrap();
        assert_eq!(orch.radar_1().is_stuck(), n >= 31, "tick {n}");
        clock.advance(TICK);
    }
    link.sent()
}

#[test]
fn stuck_radar_can_inhibit_on() {
    assert_eq!(sent_with_radar_1_stuck(false), vec![Command::On]);
    assert!(sent_with_radar_1_stuck(true).is_empty());
}

#[derive(Clone, Default)]
struct Rows(Arc<Mutex<Vec<TelemetryRecord>>>);

impl TelemetrySink for Rows {
    fn record(&mut self, rec: &TelemetryRecord) -> glass_core::Result<()> {
        self.0.lock().unwrap().push(rec.clone());
        Ok(())
    }
}

#[test]
fn every_decided_tick_emits_one_row() {
    let rows = Rows::default();
    let (r1, r2) = (ScriptedRadar::new(), ScriptedRadar::new());
    r1.set_pending_bytes(7);
    r2.push_failure();
    let mut orch = Orchestrator::new(
        (r1, r2),
        (snappy(), snappy()),
        RecordingLink::new(),
        OrchestratorCfg::default(),
        TestClock::new(),
    )
    .with_telemetry(rows.clone());
    for _ in 0..4 {
        orch.tick().unwrap();
    }
    let rows = rows.0.lock().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].r1_pending_bytes, 7);
    assert_eq!(rows[0].r2_pending_bytes, 0);
    assert_eq!(rows[0].r1_distance_raw, None);
    assert_eq!(rows[0].r1_distance_reliable, 4000.0);
    assert!(rows.iter().all(|r| r.command.is_none() && r.cmd_allowed));
}

proptest! {
    #[test]
    fn commands_are_spaced_by_the_state_delay(pattern in prop::collection::vec(any::<bool>(), 1..150)) {
        let mut rig = Rig::new(snappy(), OrchestratorCfg::default());
        let mut last: Option<Instant> = None;
        for near in pattern {
            rig.both_near(near);
            let (t, at) = rig.tick();
            if Rig::command_of(&t).is_some() {
                if let Some(prev) = last {
                    prop_assert!(at.duration_since(prev) >= Duration::from_secs(3));
                }
                last = Some(at);
            }
        }
        // ON and OFF strictly alternate, starting with ON
        let sent = rig.link.sent();
        for (i, c) in sent.iter().enumerate() {
            prop_assert_eq!(*c, if i % 2 == 0 { Command::On } else { Command::Off });
        }
    }
}
