//! Human-readable engine events.

/// An event worth telling the operator about. Logged at `info` and returned
/// in the tick report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    Stopped,
    StoppedCheckStarterInput,
    WaitingForPowerUp { secs: u64 },
    Starting { up_to_s: f32 },
    HeightReached { climbed_m: f32 },
    Running { rpm: Option<f32> },
    StartFailed,
    Died { rpm: f32 },
    ThrottleOverride { from: i8, to: i8 },
    TakeoffHeightSet { metres: f32 },
    StartControlDisabled,
}

impl core::fmt::Display for Notice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Stopped => f.write_str("Engine stopped"),
            Self::StoppedCheckStarterInput => f.write_str("Engine stopped, check starter input"),
            Self::WaitingForPowerUp { secs } => write!(f, "Engine waiting for {secs}s"),
            Self::Starting { up_to_s } => write!(f, "Engine starting for up to {up_to_s:.1}s"),
            Self::HeightReached { climbed_m } => {
                write!(f, "Engine starting height reached {climbed_m:.1}")
            }
            Self::Running { rpm: Some(rpm) } => {
                write!(f, "Engine running! Detected {} rpm", rpm as i32)
            }
            Self::Running { rpm: None } => f.write_str("Engine running!"),
            Self::StartFailed => f.write_str("Engine start failed"),
            Self::Died { rpm } => write!(f, "Engine died while running: {} rpm", rpm as i32),
            Self::ThrottleOverride { from, to } => {
                write!(f, "Engine Throttle override from {from} to {to}")
            }
            Self::TakeoffHeightSet { metres } => write!(f, "Takeoff height set to {metres:.1}m"),
            Self::StartControlDisabled => f.write_str("Engine: start control disabled"),
        }
    }
}
