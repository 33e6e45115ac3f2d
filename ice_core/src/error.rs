use thiserror::Error;

/// Why a command was refused. A rejected command leaves engine state untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("start switch is in the off position")]
    StartBlockedBySwitch,
    #[error("unknown gear state code {0}")]
    UnknownGear(u8),
    #[error("command kind is outbound-only")]
    OutboundOnly,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IceError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("command rejected: {0}")]
    Rejected(RejectReason),
    #[error("telemetry link error: {0}")]
    Link(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing rc input")]
    MissingRcInput,
    #[error("missing servo outputs")]
    MissingServos,
    #[error("missing arming source")]
    MissingArming,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
