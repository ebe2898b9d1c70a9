//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::WakeLockMode,
    state::{IntervalMode, NotificationPolicy, SessionView, TimerSnapshot},
};

/// Body of `POST /duration`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationRequest {
    pub minutes: u32,
}

/// Body of `POST /visibility`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// Body of `POST /preview`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub mode: IntervalMode,
}

/// Timer portion shared by all responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub session: SessionView,
    pub remaining_seconds: u64,
    pub percentage: f64,
    pub policy: NotificationPolicy,
    pub visible: bool,
    pub speech_unlocked: bool,
}

impl TimerView {
    pub fn new(snapshot: &TimerSnapshot, now_ms: i64) -> Self {
        let frame = snapshot.display_frame(now_ms);
        Self {
            session: SessionView::from(&snapshot.session),
            remaining_seconds: frame.remaining_seconds,
            percentage: frame.percentage,
            policy: snapshot.policy,
            visible: snapshot.visible,
            speech_unlocked: snapshot.speech_unlocked,
        }
    }
}

/// API response structure for interaction endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl ApiResponse {
    pub fn new(message: impl Into<String>, timer: TimerView) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Status response with daemon metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub timer: TimerView,
    pub wake_lock: WakeLockMode,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
