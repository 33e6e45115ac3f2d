//! External engine and transmission commands (mission items, ground station).

use crate::engine::IcEngine;
use crate::error::{IceError, RejectReason};
use crate::notice::Notice;
use crate::output::{GearCommand, GearState};
use crate::state::SwitchPosition;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    EngineControl {
        start: f32,
        cold_start: f32,
        height_delay: f32,
    },
    SetTransmissionState {
        gear: u8,
        pwm: u16,
    },
    /// Outbound status kinds; refused when received.
    TransmissionState,
    FuelLevel,
    CoolantTemp,
}

/// PWM for a gear. `PwmValue` passes `explicit` through; `Unknown` has none.
pub const fn gear_pwm(gear: GearState, explicit: u16) -> Option<u16> {
    match gear {
        GearState::Unknown => None,
        GearState::Park => Some(1100),
        GearState::Reverse | GearState::Reverse1 => Some(1300),
        GearState::Neutral => Some(1500),
        GearState::Forward | GearState::Forward1 => Some(1700),
        GearState::Forward2 => Some(1900),
        GearState::PwmValue => Some(explicit),
    }
}

impl IcEngine {
    /// Start or stop the engine. `start <= 0` stops unconditionally. A positive
    /// `height_delay` waits for the vehicle to climb that far before cranking.
    pub fn engine_control(
        &mut self,
        start: f32,
        _cold_start: f32,
        height_delay: f32,
    ) -> Result<(), IceError> {
        if start <= 0.0 {
            self.controller.force_off();
            return Ok(());
        }

        let chan = self.controller.start_cfg().start_chan;
        if chan > 0
            && self
                .rc
                .radio_in(chan)
                .is_some_and(|pwm| SwitchPosition::from_pwm(pwm) == SwitchPosition::Off)
        {
            self.notify(Notice::StartControlDisabled);
            return Err(IceError::Rejected(RejectReason::StartBlockedBySwitch));
        }

        if height_delay > 0.0 {
            self.controller.begin_height_delay(height_delay);
            self.notify(Notice::TakeoffHeightSet {
                metres: height_delay,
            });
        } else {
            self.controller.begin_starting();
        }
        Ok(())
    }

    /// Select a transmission gear by status code, or an explicit PWM with code 8.
    pub fn set_transmission_state(&mut self, code: u8, pwm: u16) -> Result<GearCommand, IceError> {
        let state = GearState::from_code(code);
        let (Some(state), Some(pwm)) = (state, state.and_then(|s| gear_pwm(s, pwm))) else {
            return Err(IceError::Rejected(RejectReason::UnknownGear(code)));
        };
        let cmd = GearCommand { state, pwm };
        self.outputs.set_gear(cmd);
        self.telemetry.force_next();
        tracing::debug!(?state, pwm, "gear set");
        Ok(cmd)
    }

    pub fn handle_command(&mut self, cmd: EngineCommand) -> Result<(), IceError> {
        match cmd {
            EngineCommand::EngineControl {
                start,
                cold_start,
                height_delay,
            } => self.engine_control(start, cold_start, height_delay),
            EngineCommand::SetTransmissionState { gear, pwm } => {
                self.set_transmission_state(gear, pwm).map(|_| ())
            }
            EngineCommand::TransmissionState
            | EngineCommand::FuelLevel
            | EngineCommand::CoolantTemp => Err(IceError::Rejected(RejectReason::OutboundOnly)),
        }
    }
}
