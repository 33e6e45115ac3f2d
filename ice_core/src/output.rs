//! Engine state to actuator commands.

use ice_traits::{ServoFunction, ServoOutputs};

use crate::hw_error::best_effort;
use crate::state::EngineState;

/// Gear PWM reported when no gear output is assigned.
pub const GEAR_PWM_INVALID: u16 = 0;

const SCALED_ON: f32 = 100.0;
const SCALED_OFF: f32 = 0.0;

/// Transmission gear, with its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum GearState {
    #[default]
    Unknown = 0,
    Park = 1,
    Reverse = 2,
    Reverse1 = 3,
    Neutral = 4,
    Forward = 5,
    Forward1 = 6,
    Forward2 = 7,
    PwmValue = 8,
}

impl GearState {
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Unknown,
            1 => Self::Park,
            2 => Self::Reverse,
            3 => Self::Reverse1,
            4 => Self::Neutral,
            5 => Self::Forward,
            6 => Self::Forward1,
            7 => Self::Forward2,
            8 => Self::PwmValue,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GearCommand {
    pub state: GearState,
    pub pwm: u16,
}

impl Default for GearCommand {
    fn default() -> Self {
        Self {
            state: GearState::Unknown,
            pwm: GEAR_PWM_INVALID,
        }
    }
}

/// Drives ignition, starter and gear outputs from the engine state.
#[derive(Debug, Clone, Default)]
pub struct OutputMapper {
    gear: GearCommand,
}

impl OutputMapper {
    pub fn gear(&self) -> GearCommand {
        self.gear
    }

    pub(crate) fn set_gear(&mut self, cmd: GearCommand) {
        self.gear = cmd;
    }

    /// Write the outputs for `state`. Safe to call every tick.
    pub fn apply(&mut self, state: EngineState, servos: &mut dyn ServoOutputs) {
        match state {
            EngineState::Off => {
                for f in [ServoFunction::Ignition, ServoFunction::Starter] {
                    if servos.function_assigned(f) {
                        best_effort(servos.set_output_to_trim(f), "trim");
                    }
                }
            }
            EngineState::StartHeightDelay | EngineState::StartDelay | EngineState::Running => {
                Self::scaled(servos, SCALED_ON, SCALED_OFF);
            }
            EngineState::Starting => Self::scaled(servos, SCALED_ON, SCALED_ON),
        }
        self.apply_gear(servos);
    }

    fn scaled(servos: &mut dyn ServoOutputs, ignition: f32, starter: f32) {
        best_effort(
            servos.set_output_scaled(ServoFunction::Ignition, ignition),
            "ignition",
        );
        best_effort(
            servos.set_output_scaled(ServoFunction::Starter, starter),
            "starter",
        );
    }

    fn apply_gear(&mut self, servos: &mut dyn ServoOutputs) {
        if !servos.function_assigned(ServoFunction::EngineGear) {
            self.gear = GearCommand::default();
        } else if self.gear.state == GearState::Unknown {
            best_effort(
                servos.set_output_to_trim(ServoFunction::EngineGear),
                "gear trim",
            );
            if let Some(pwm) = servos.output_pwm(ServoFunction::EngineGear) {
                self.gear.pwm = pwm;
            }
        } else {
            best_effort(
                servos.set_output_pwm(ServoFunction::EngineGear, self.gear.pwm),
                "gear",
            );
        }
    }
}
