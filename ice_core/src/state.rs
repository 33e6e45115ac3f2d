//! Engine state and start switch classification.

/// Switch readings at or below this are `Off`.
pub const SWITCH_OFF_MAX_PWM: u16 = 1300;
/// Switch readings at or above this request a start.
pub const SWITCH_START_MIN_PWM: u16 = 1700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EngineState {
    #[default]
    Off = 0,
    StartHeightDelay = 1,
    StartDelay = 2,
    Starting = 3,
    Running = 4,
}

impl EngineState {
    /// Numeric code used in status output.
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::StartHeightDelay => "start_height_delay",
            Self::StartDelay => "start_delay",
            Self::Starting => "starting",
            Self::Running => "running",
        }
    }
}

impl core::fmt::Display for EngineState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-band classification of the start switch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPosition {
    Off,
    AccessoryRun,
    AccessoryRunAndStart,
}

impl SwitchPosition {
    pub const fn from_pwm(pwm: u16) -> Self {
        if pwm <= SWITCH_OFF_MAX_PWM {
            Self::Off
        } else if pwm >= SWITCH_START_MIN_PWM {
            Self::AccessoryRunAndStart
        } else {
            Self::AccessoryRun
        }
    }
}
