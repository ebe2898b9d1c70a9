//! Wall-clock source

use chrono::{Local, TimeZone, Utc};

/// Source of wall-clock time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;

    /// Offset of local time from UTC at `at_ms`, in seconds
    fn utc_offset_secs(&self, at_ms: i64) -> i32;
}

/// The system clock and local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn utc_offset_secs(&self, at_ms: i64) -> i32 {
        Local
            .timestamp_millis_opt(at_ms)
            .single()
            .map(|at| at.offset().local_minus_utc())
            .unwrap_or(0)
    }
}
