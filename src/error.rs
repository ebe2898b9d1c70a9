//! Error types shared across the crate

use thiserror::Error;

use crate::state::TimerStatus;

/// Errors raised by the timer state machine and its callers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: TimerStatus,
        action: &'static str,
    },
    #[error("duration must be between 0 and 60 minutes, got {0}")]
    InvalidDuration(u32),
    #[error("interval must be one of 0, 1, 2, 5, 10, 15, 20, 30 minutes, got {0}")]
    InvalidInterval(u32),
    #[error("stale event for revision {event} (current revision {current})")]
    StaleEvent { event: u64, current: u64 },
    #[error("failed to lock timer state: {0}")]
    Lock(String),
}

/// Errors raised while acquiring or releasing sleep prevention
#[derive(Debug, Error)]
pub enum WakeLockError {
    #[error("sleep prevention unavailable: {0}")]
    Unsupported(String),
    #[error("sleep prevention denied: {0}")]
    Denied(String),
    #[error("sleep prevention I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the tone and speech collaborators
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid tone command: {0}")]
    InvalidTone(String),
    #[error("playback rejected: {0}")]
    Rejected(String),
    #[error("notification I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the settings store
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings path has no parent directory")]
    NoParent,
}
