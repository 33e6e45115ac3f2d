mod common;

use common::*;
use ice_core::{EngineState, Notice, ThrottleCfg};
use rstest::rstest;

#[test]
fn start_throttle_while_cranking_and_waiting() {
    let mut b = bench();
    b.switch(SWITCH_START);
    b.tick();
    assert_eq!(b.engine.state(), EngineState::StartDelay);
    assert_eq!(b.engine.throttle_override(40), Some(5));
    b.tick_after(100);
    assert_eq!(b.engine.state(), EngineState::Starting);
    assert_eq!(b.engine.throttle_override(40), Some(5));
    assert_eq!(b.engine.brake_override(), Some(100.0));
}

#[test]
fn no_brake_outside_starting() {
    let mut b = bench();
    b.start_engine();
    assert_eq!(b.engine.brake_override(), None);
    assert_eq!(b.engine.throttle_override(40), None);
}

#[test]
fn disabled_module_never_overrides() {
    let mut b = bench_with(|bld| bld.with_enabled(false));
    b.tick();
    assert_eq!(b.engine.throttle_override(0), None);
    assert_eq!(b.engine.brake_override(), None);
}

#[rstest]
#[case::too_hot(1.5, 40, Some(10))]
#[case::too_cold(0.05, 40, Some(0))]
#[case::normal(0.8, 40, None)]
fn temperature_shapes_running_throttle(
    #[case] volts: f32,
    #[case] current: i8,
    #[case] expected: Option<i8>,
) {
    let mut b = bench();
    b.start_engine();
    b.vehicle.set_analog(TEMP_PIN, Some(volts));
    b.tick_after(100);
    assert_eq!(b.engine.throttle_override(current), expected);
}

#[test]
fn stale_temperature_is_ignored() {
    let mut b = bench();
    b.start_engine();
    b.vehicle.set_analog(TEMP_PIN, Some(1.5));
    b.tick_after(100);
    assert!(b.engine.too_hot());
    b.vehicle.set_analog(TEMP_PIN, None);
    b.run_for(5_000, 100);
    assert_eq!(b.engine.temperature(), None);
    assert!(!b.engine.too_hot());
    assert_eq!(b.engine.throttle_override(40), None);
}

#[test]
fn idle_floor_while_running() {
    let mut b = bench_with(|bld| {
        bld.with_throttle(ThrottleCfg {
            start_pct: 5,
            idle_pct: 15,
        })
    });
    b.start_engine();
    assert_eq!(b.engine.throttle_override(3), Some(15));
    assert_eq!(b.engine.throttle_override(30), None);
}

#[test]
fn override_notice_reaches_tick_report() {
    let mut b = bench();
    b.switch(SWITCH_START);
    b.tick();
    b.engine.throttle_override(40);
    b.engine.throttle_override(40);
    let t = b.tick_after(100);
    assert_eq!(
        t.notices.first(),
        Some(&Notice::ThrottleOverride { from: 40, to: 5 })
    );
    assert_eq!(
        t.notices
            .iter()
            .filter(|n| matches!(n, Notice::ThrottleOverride { .. }))
            .count(),
        1
    );
}
