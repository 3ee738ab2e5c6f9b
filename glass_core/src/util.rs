//! Common time and filter helpers for glass_core.

use std::time::Duration;

/// Number of nanoseconds in one second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Half of one drive period for `freq_hz`, in whole nanoseconds.
/// Clamps `hz` to at least 1 to avoid division by zero.
#[inline]
pub fn half_period(freq_hz: u32) -> Duration {
    Duration::from_nanos(NANOS_PER_SEC / (2 * u64::from(freq_hz.max(1))))
}

/// Seconds from config to a `Duration`. Negative values and NaN become zero;
/// anything too large for a `Duration` saturates to `Duration::MAX`.
#[inline]
pub fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => d,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

/// Move `current` toward `input` by at most `delta`, then clamp to `[0, max]`.
#[inline]
pub fn rate_limited(current: f64, input: f64, delta: f64, max: f64) -> f64 {
    let diff = (input - current).clamp(-delta, delta);
    (current + diff).clamp(0.0, max)
}
