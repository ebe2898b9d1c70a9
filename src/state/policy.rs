//! Notification policy: how and when the timer makes noise

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Allowed recurring alert periods in minutes; `0` disables recurring alerts
pub const INTERVAL_STEPS: [u32; 8] = [0, 1, 2, 5, 10, 15, 20, 30];

/// Recurring alert period, restricted to [`INTERVAL_STEPS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IntervalMinutes(u32);

impl IntervalMinutes {
    pub const OFF: IntervalMinutes = IntervalMinutes(0);

    pub fn new(minutes: u32) -> Result<Self, TimerError> {
        if INTERVAL_STEPS.contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(TimerError::InvalidInterval(minutes))
        }
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn is_enabled(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<u32> for IntervalMinutes {
    type Error = TimerError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<IntervalMinutes> for u32 {
    fn from(interval: IntervalMinutes) -> Self {
        interval.0
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        Self(5)
    }
}

/// How the recurring alert is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalMode {
    #[default]
    Beep,
    Speech,
}

/// Notification settings, changed only by explicit settings updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPolicy {
    pub auto_restart: bool,
    pub interval_minutes: IntervalMinutes,
    pub interval_mode: IntervalMode,
    pub ui_chime_enabled: bool,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            auto_restart: true,
            interval_minutes: IntervalMinutes::default(),
            interval_mode: IntervalMode::Beep,
            ui_chime_enabled: true,
        }
    }
}

/// Partial policy update; absent fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPatch {
    pub auto_restart: Option<bool>,
    pub interval_minutes: Option<IntervalMinutes>,
    pub interval_mode: Option<IntervalMode>,
    pub ui_chime_enabled: Option<bool>,
}

impl PolicyPatch {
    pub fn is_empty(&self) -> bool {
        self.auto_restart.is_none()
            && self.interval_minutes.is_none()
            && self.interval_mode.is_none()
            && self.ui_chime_enabled.is_none()
    }
}

impl NotificationPolicy {
    /// Return a copy with the patch applied
    pub fn patched(&self, patch: &PolicyPatch) -> Self {
        Self {
            auto_restart: patch.auto_restart.unwrap_or(self.auto_restart),
            interval_minutes: patch.interval_minutes.unwrap_or(self.interval_minutes),
            interval_mode: patch.interval_mode.unwrap_or(self.interval_mode),
            ui_chime_enabled: patch.ui_chime_enabled.unwrap_or(self.ui_chime_enabled),
        }
    }
}
