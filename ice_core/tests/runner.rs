mod common;

use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use common::*;
use ice_core::runner::{StopReason, run};
use ice_core::{BuildError, EngineState};

#[test]
fn tick_budget_runs_in_simulated_time() {
    let mut b = bench();
    b.switch(SWITCH_START);
    let stop = AtomicBool::new(false);
    let summary = run(&mut b.engine, 10, Some(50), &stop, |_, _| ControlFlow::Continue(())).unwrap();
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.stop, StopReason::TickBudget);
    assert_eq!(summary.final_state, EngineState::Running);
    assert_eq!(b.clock.elapsed(), Duration::from_millis(5_000));
}

#[test]
fn callback_can_stop_the_loop() {
    let mut b = bench();
    b.switch(SWITCH_START);
    let stop = AtomicBool::new(false);
    let summary = run(&mut b.engine, 20, Some(10_000), &stop, |_, tick| {
        if tick.state == EngineState::Starting {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .unwrap();
    assert_eq!(summary.stop, StopReason::Requested);
    assert_eq!(summary.ticks, 2);
    assert_eq!(summary.final_state, EngineState::Starting);
}

#[test]
fn shutdown_stops_engine_and_inhibits_outputs() {
    let mut b = bench();
    b.start_engine();
    let stop = AtomicBool::new(true);
    let summary = run(&mut b.engine, 10, None, &stop, |_, _| ControlFlow::Continue(())).unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(summary.stop, StopReason::Shutdown);
    assert_eq!(summary.final_state, EngineState::Off);
    assert_eq!(b.vehicle.pin_level(OUT_EN_PIN as u8), Some(true));
}

#[test]
fn rejects_slow_tick_rates() {
    let mut b = bench();
    let stop = AtomicBool::new(false);
    let err = run(&mut b.engine, 5, Some(1), &stop, |_, _| ControlFlow::Continue(())).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig("rate_hz must be >= 10"))
    ));
}
