//! Planning of the next audible event
//!
//! Recurring alerts are aligned to the local wall clock (every 5 minutes means
//! :00, :05, :10 ... of the real clock), not to offsets from session start.

use serde::{Deserialize, Serialize};

use super::{TimerSnapshot, TimerStatus};

/// A boundary closer than this is treated as already passed
pub const MIN_LEAD_MS: i64 = 50;

const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Interval,
    Completion,
}

/// The single next notable instant while running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub fire_at_ms: i64,
    pub kind: EventKind,
    /// Machine revision this event was planned against
    pub revision: u64,
}

impl ScheduledEvent {
    /// Milliseconds to wait from `now_ms`, never negative
    pub fn delay_ms(&self, now_ms: i64) -> u64 {
        (self.fire_at_ms - now_ms).max(0) as u64
    }
}

/// Next instant that is a whole multiple of `interval_minutes` past the local
/// hour and at least [`MIN_LEAD_MS`] after `now_ms`.
pub fn next_aligned_boundary(now_ms: i64, interval_minutes: u32, utc_offset_secs: i32) -> i64 {
    let period = i64::from(interval_minutes.max(1)) * MINUTE_MS;
    let offset_ms = i64::from(utc_offset_secs) * 1000;
    let local = now_ms + offset_ms + MIN_LEAD_MS;
    let next_local = (local.div_euclid(period) + 1) * period;
    next_local - offset_ms
}

/// Compute the one event that should be armed for `snapshot` at `now_ms`.
///
/// Returns `None` unless the timer is running. Completion wins whenever the
/// next boundary would land on or after it.
pub fn next_event(now_ms: i64, snapshot: &TimerSnapshot, utc_offset_secs: i32) -> Option<ScheduledEvent> {
    next_event_after(now_ms, snapshot, utc_offset_secs, None)
}

/// Like [`next_event`], but the interval boundary is also planned strictly
/// after `last_boundary_ms`, the last boundary that already fired. A wall
/// clock stepped backwards can otherwise hand out the same boundary twice.
pub fn next_event_after(
    now_ms: i64,
    snapshot: &TimerSnapshot,
    utc_offset_secs: i32,
    last_boundary_ms: Option<i64>,
) -> Option<ScheduledEvent> {
    if snapshot.session.status() != TimerStatus::Running {
        return None;
    }

    let remaining = snapshot.session.remaining_ms(now_ms);
    let completion_at = now_ms + remaining;
    let mut event = ScheduledEvent {
        fire_at_ms: completion_at,
        kind: EventKind::Completion,
        revision: snapshot.revision,
    };

    let interval = snapshot.policy.interval_minutes;
    if interval.is_enabled() && remaining > 0 {
        let from = last_boundary_ms.map_or(now_ms, |last| last.max(now_ms));
        let boundary = next_aligned_boundary(from, interval.minutes(), utc_offset_secs);
        if boundary < completion_at {
            event.fire_at_ms = boundary;
            event.kind = EventKind::Interval;
        }
    }

    Some(event)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::state::{IntervalMinutes, NotificationPolicy, TimerMachine};

    fn at(h: u32, m: u32, s: u32) -> i64 {
        let naive = NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap();
        Utc.from_utc_datetime(&naive).timestamp_millis()
    }

    fn running(minutes: u32, interval: u32, started: i64) -> TimerSnapshot {
        let policy = NotificationPolicy {
            interval_minutes: IntervalMinutes::new(interval).unwrap(),
            ..Default::default()
        };
        let mut machine = TimerMachine::new(i64::from(minutes) * 60_000, policy);
        machine.start(started).unwrap();
        machine.snapshot()
    }

    #[test]
    fn aligns_to_the_clock_not_to_session_start() {
        let start = at(10, 2, 0);
        let snapshot = running(45, 5, start);
        let event = next_event(start, &snapshot, 0).unwrap();
        assert_eq!(event.kind, EventKind::Interval);
        assert_eq!(event.fire_at_ms, at(10, 5, 0));
    }

    #[test]
    fn boundary_rolls_over_the_hour() {
        assert_eq!(next_aligned_boundary(at(10, 50, 30), 15, 0), at(11, 0, 0));
        assert_eq!(next_aligned_boundary(at(23, 59, 59), 1, 0), at(0, 0, 0) + 86_400_000);
    }

    #[test]
    fn boundary_respects_local_offset() {
        // UTC+05:30: 10:02 UTC is 15:32 local, next 20 minute mark is 15:40 local
        let offset = 5 * 3600 + 30 * 60;
        assert_eq!(next_aligned_boundary(at(10, 2, 0), 20, offset), at(10, 10, 0));
    }

    #[test]
    fn boundary_inside_lead_window_is_skipped() {
        let just_before = at(10, 5, 0) - 20;
        assert_eq!(next_aligned_boundary(just_before, 5, 0), at(10, 10, 0));
        assert_eq!(next_aligned_boundary(at(10, 5, 0), 5, 0), at(10, 10, 0));
    }

    #[test]
    fn completion_takes_precedence_over_a_later_boundary() {
        let start = at(10, 2, 0);
        let snapshot = running(2, 5, start);
        let event = next_event(start, &snapshot, 0).unwrap();
        assert_eq!(event.kind, EventKind::Completion);
        assert_eq!(event.fire_at_ms, at(10, 4, 0));
    }

    #[test]
    fn completion_wins_a_tie() {
        let start = at(10, 2, 0);
        let snapshot = running(3, 5, start);
        let event = next_event(start, &snapshot, 0).unwrap();
        assert_eq!(event.kind, EventKind::Completion);
        assert_eq!(event.fire_at_ms, at(10, 5, 0));
    }

    #[test]
    fn disabled_interval_only_arms_completion() {
        let start = at(10, 2, 0);
        let snapshot = running(45, 0, start);
        let event = next_event(start, &snapshot, 0).unwrap();
        assert_eq!(event.kind, EventKind::Completion);
        assert_eq!(event.fire_at_ms, at(10, 47, 0));
    }

    #[test]
    fn fired_boundary_is_not_planned_again_after_a_clock_step() {
        let start = at(10, 2, 0);
        let snapshot = running(45, 5, start);
        // woke half a second before 10:05 by the wall clock, after firing it
        let now = at(10, 5, 0) - 500;
        assert_eq!(next_event(now, &snapshot, 0).unwrap().fire_at_ms, at(10, 5, 0));

        let event = next_event_after(now, &snapshot, 0, Some(at(10, 5, 0))).unwrap();
        assert_eq!(event.kind, EventKind::Interval);
        assert_eq!(event.fire_at_ms, at(10, 10, 0));
    }

    #[test]
    fn old_boundary_does_not_hold_back_planning() {
        let start = at(10, 2, 0);
        let snapshot = running(45, 5, start);
        let event = next_event_after(at(10, 21, 0), &snapshot, 0, Some(at(10, 5, 0))).unwrap();
        assert_eq!(event.fire_at_ms, at(10, 25, 0));
    }

    #[test]
    fn nothing_is_armed_unless_running() {
        let machine = TimerMachine::new(60_000, NotificationPolicy::default());
        assert_eq!(next_event(0, &machine.snapshot(), 0), None);
    }

    #[test]
    fn overdue_session_fires_completion_immediately() {
        let start = at(10, 0, 0);
        let snapshot = running(1, 5, start);
        let now = at(10, 3, 0);
        let event = next_event(now, &snapshot, 0).unwrap();
        assert_eq!(event.kind, EventKind::Completion);
        assert_eq!(event.delay_ms(now), 0);
    }
}
