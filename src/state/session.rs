//! Timer session record and its status

use std::fmt;

use serde::{Deserialize, Serialize};

use super::elapsed;

/// Default session length (45 minutes)
pub const DEFAULT_DURATION_MS: i64 = 45 * 60 * 1000;

/// Coarse status of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Which timing value is authoritative right now.
///
/// Only one of the start timestamp and the paused snapshot can exist at a
/// time, and neither exists while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running { start_timestamp: i64 },
    Paused { remaining_ms: i64 },
}

/// The authoritative timing record.
///
/// Fields are private: only the state machine in this module tree mutates a
/// session, everyone else works from a cloned snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    total_duration_ms: i64,
    phase: Phase,
}

impl TimerSession {
    /// Create an idle session of the given length
    pub fn new(total_duration_ms: i64) -> Self {
        Self {
            total_duration_ms: total_duration_ms.max(1),
            phase: Phase::Idle,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match self.phase {
            Phase::Idle => TimerStatus::Idle,
            Phase::Running { .. } => TimerStatus::Running,
            Phase::Paused { .. } => TimerStatus::Paused,
        }
    }

    pub fn total_duration_ms(&self) -> i64 {
        self.total_duration_ms
    }

    /// Start timestamp, only meaningful while running
    pub fn start_timestamp(&self) -> Option<i64> {
        match self.phase {
            Phase::Running { start_timestamp } => Some(start_timestamp),
            _ => None,
        }
    }

    /// Remaining time snapshotted at pause, only meaningful while paused
    pub fn paused_remaining_ms(&self) -> Option<i64> {
        match self.phase {
            Phase::Paused { remaining_ms } => Some(remaining_ms),
            _ => None,
        }
    }

    /// Remaining milliseconds at `now_ms` for any status
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        match self.phase {
            Phase::Idle => self.total_duration_ms,
            Phase::Running { start_timestamp } => {
                elapsed::remaining_ms(now_ms, start_timestamp, self.total_duration_ms)
            }
            Phase::Paused { remaining_ms } => remaining_ms,
        }
    }

    pub(crate) fn run_from(&mut self, start_timestamp: i64) {
        self.phase = Phase::Running { start_timestamp };
    }

    pub(crate) fn pause_with(&mut self, remaining_ms: i64) {
        self.phase = Phase::Paused {
            remaining_ms: remaining_ms.max(0),
        };
    }

    pub(crate) fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    pub(crate) fn set_total_duration_ms(&mut self, total_duration_ms: i64) {
        self.total_duration_ms = total_duration_ms.max(1);
    }
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}

/// Wire form of a session for status responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub status: TimerStatus,
    pub total_duration_ms: i64,
    pub start_timestamp: Option<i64>,
    pub paused_remaining_ms: Option<i64>,
}

impl From<&TimerSession> for SessionView {
    fn from(session: &TimerSession) -> Self {
        Self {
            status: session.status(),
            total_duration_ms: session.total_duration_ms(),
            start_timestamp: session.start_timestamp(),
            paused_remaining_ms: session.paused_remaining_ms(),
        }
    }
}
