//! Wall-clock elapsed time calculations
//!
//! Remaining time is always derived from the start timestamp and the current
//! wall-clock instant, never decremented tick by tick. A missed or late tick
//! therefore cannot lose time.

/// Full scale of the dial face (one hour), independent of the session length
pub const FULL_SCALE_MS: i64 = 3_600_000;

/// Remaining milliseconds of a session started at `start_ms` lasting `total_ms`
pub fn remaining_ms(now_ms: i64, start_ms: i64, total_ms: i64) -> i64 {
    (total_ms - (now_ms - start_ms)).max(0)
}

/// Whole seconds shown on the digital display, rounded up
pub fn remaining_seconds(remaining_ms: i64) -> u64 {
    if remaining_ms <= 0 {
        return 0;
    }
    ((remaining_ms + 999) / 1000) as u64
}

/// Dial fill percentage in `[0, 100]` relative to the one hour face
pub fn percentage(remaining_ms: i64) -> f64 {
    let pct = remaining_ms as f64 / FULL_SCALE_MS as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}
