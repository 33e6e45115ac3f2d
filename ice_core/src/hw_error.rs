//! Maps `Box<dyn Error>` from trait boundaries to typed `IceError`.
//!
//! The traits in `ice_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `ice_hardware::HwError` downcasting.

use crate::error::IceError;

/// Map a trait-boundary error to a typed `IceError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to the display string.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> IceError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<ice_hardware::error::HwError>() {
            return IceError::HardwareFault(hw.to_string());
        }
    }

    IceError::Hardware(e.to_string())
}

/// Log and swallow an actuator write failure. Output writes are re-issued
/// every tick, so a single failed write is never fatal.
pub(crate) fn best_effort(
    res: std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>,
    what: &'static str,
) {
    if let Err(e) = res {
        let err = map_hw_error(&*e);
        tracing::warn!(error = %err, what, "actuator write failed (continuing)");
    }
}
