mod common;

use common::*;
use ice_core::{EngineState, GearState};
use ice_core::output::GEAR_PWM_INVALID;
use ice_hardware::SimServos;
use ice_traits::ServoFunction;

#[test]
fn actuators_follow_state() {
    let mut b = bench();
    b.switch(SWITCH_OFF);
    b.tick();
    assert_eq!(b.servos.pwm(ServoFunction::Ignition), Some(1000));
    assert_eq!(b.servos.pwm(ServoFunction::Starter), Some(1000));

    b.switch(SWITCH_START);
    b.tick_after(100);
    assert_eq!(b.engine.state(), EngineState::StartDelay);
    assert!(b.servos.is_on(ServoFunction::Ignition));
    assert!(!b.servos.is_on(ServoFunction::Starter));

    b.tick_after(100);
    assert_eq!(b.engine.state(), EngineState::Starting);
    assert!(b.servos.is_on(ServoFunction::Ignition));
    assert!(b.servos.is_on(ServoFunction::Starter));

    b.run_for(3_100, 100);
    assert_eq!(b.engine.state(), EngineState::Running);
    assert!(b.servos.is_on(ServoFunction::Ignition));
    assert!(!b.servos.is_on(ServoFunction::Starter));

    b.switch(SWITCH_OFF);
    b.tick_after(100);
    assert_eq!(b.servos.pwm(ServoFunction::Ignition), Some(1000));
    assert_eq!(b.servos.pwm(ServoFunction::Starter), Some(1000));
}

#[test]
fn gear_seeds_from_trim_until_commanded() {
    let mut b = bench();
    b.tick();
    let gear = b.engine.gear();
    assert_eq!(gear.state, GearState::Unknown);
    assert_eq!(gear.pwm, 1500);
}

#[test]
fn unassigned_gear_reports_invalid() {
    let mut b = bench_with_servos(SimServos::new(), |bld| bld);
    b.tick();
    b.engine.set_transmission_state(1, 0).unwrap();
    b.tick_after(100);
    let gear = b.engine.gear();
    assert_eq!(gear.state, GearState::Unknown);
    assert_eq!(gear.pwm, GEAR_PWM_INVALID);
}

#[test]
fn unassigned_ignition_is_left_alone_when_off() {
    let servos = SimServos::new();
    servos.unassign(ServoFunction::Ignition);
    let mut b = bench_with_servos(servos, |bld| bld);
    b.switch(SWITCH_OFF);
    b.tick();
    assert_eq!(b.servos.pwm(ServoFunction::Ignition), None);
    assert_eq!(b.servos.pwm(ServoFunction::Starter), Some(1000));
}

#[test]
fn output_write_faults_do_not_stop_the_state_machine() {
    let mut b = bench();
    b.servos.inject_write_fault(true);
    b.switch(SWITCH_START);
    b.tick();
    assert_eq!(b.tick_after(100).state, EngineState::Starting);
    b.servos.inject_write_fault(false);
    b.tick_after(100);
    assert!(b.servos.is_on(ServoFunction::Starter));
}

#[test]
fn enable_gate_drives_output_enable_pin() {
    let mut b = bench_with(|bld| bld.with_enabled(false));
    b.switch(SWITCH_START);
    let t = b.tick();
    assert_eq!(t.state, EngineState::Off);
    assert_eq!(b.vehicle.pin_level(OUT_EN_PIN as u8), None);
    assert_eq!(b.servos.pwm(ServoFunction::Ignition), None);

    b.engine.set_enabled(true);
    let t = b.tick_after(100);
    assert_eq!(t.state, EngineState::StartDelay);
    assert_eq!(b.vehicle.pin_level(OUT_EN_PIN as u8), Some(false));

    b.tick_after(100);
    assert_eq!(b.engine.state(), EngineState::Starting);

    b.engine.set_enabled(false);
    let t = b.tick_after(100);
    assert_eq!(t.state, EngineState::Off);
    assert_eq!(b.vehicle.pin_level(OUT_EN_PIN as u8), Some(true));
    assert_eq!(b.servos.pwm(ServoFunction::Starter), Some(1000));
    assert_eq!(t.records_sent, 0);
}

#[test]
fn negative_output_enable_pin_is_never_written() {
    let mut b = bench_with(|bld| bld.with_output_enable_pin(-1));
    b.tick();
    assert_eq!(b.vehicle.pin_level(OUT_EN_PIN as u8), None);
}
