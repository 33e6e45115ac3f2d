//! Common time/period helpers for ice_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the tick period in milliseconds for a given rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 millisecond.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    debug_assert!(hz > 0, "rate_hz must be > 0");
    (MILLIS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Convert a non-negative duration in seconds to whole milliseconds.
/// Negative and non-finite inputs become 0.
#[inline]
pub fn secs_to_ms(secs: f32) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (f64::from(secs) * 1000.0).round() as u64
}
