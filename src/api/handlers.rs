//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    error::TimerError,
    state::{AppState, DisplayFrame, NotificationPolicy, PolicyPatch, TimerSnapshot},
};

use super::responses::{
    ApiResponse, DurationRequest, HealthResponse, PreviewRequest, StatusResponse, TimerView,
    VisibilityRequest,
};

/// Map a timer error to the HTTP status reported to the client
fn status_for(e: &TimerError) -> StatusCode {
    match e {
        TimerError::InvalidDuration(_) | TimerError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
        TimerError::InvalidTransition { .. } | TimerError::StaleEvent { .. } => StatusCode::CONFLICT,
        TimerError::Lock(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Unwrap a JSON body, reporting malformed or out-of-range input as 400
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, StatusCode> {
    payload.map(|Json(value)| value).map_err(|e| {
        warn!("Rejected request body: {}", e.body_text());
        StatusCode::BAD_REQUEST
    })
}

fn respond(
    state: &AppState,
    result: Result<TimerSnapshot, TimerError>,
    message: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    match result {
        Ok(snapshot) => {
            let timer = TimerView::new(&snapshot, state.now_ms());
            Ok(Json(ApiResponse::new(message, timer)))
        }
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("{} failed: {}", message, e);
            } else {
                warn!("{} rejected: {}", message, e);
            }
            Err(status)
        }
    }
}

/// Handle POST /tap - Display tapped: start, pause or resume
pub async fn tap_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, StatusCode> {
    let result = state.tap();
    if let Ok(snapshot) = &result {
        info!("Tap endpoint called - timer now {}", snapshot.status());
    }
    respond(&state, result, "Display tapped")
}

/// Handle POST /duration - Dial released or preset picked
pub async fn duration_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DurationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let request = body(payload)?;
    info!("Duration endpoint called - {} minutes", request.minutes);
    respond(&state, state.change_duration(request.minutes), "Duration changed")
}

/// Handle POST /dial - Dial being dragged
pub async fn dial_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.dial_moved() {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Failed to handle dial movement: {}", e);
            status_for(&e)
        }
    }
}

/// Handle POST /visibility - Host display shown or hidden
pub async fn visibility_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VisibilityRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let request = body(payload)?;
    respond(&state, state.set_visible(request.visible), "Visibility updated")
}

/// Handle GET /display - Frame currently shown
pub async fn display_handler(State(state): State<Arc<AppState>>) -> Json<DisplayFrame> {
    Json(state.shown_frame())
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let snapshot = match state.snapshot() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer: TimerView::new(&snapshot, state.now_ms()),
        wake_lock: state.wake_lock_mode(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /settings - Current notification policy
pub async fn get_settings_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NotificationPolicy>, StatusCode> {
    state
        .snapshot()
        .map(|snapshot| Json(snapshot.policy))
        .map_err(|e| {
            error!("Failed to get timer state: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Handle PUT /settings - Update the notification policy
pub async fn put_settings_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PolicyPatch>, JsonRejection>,
) -> Result<Json<NotificationPolicy>, StatusCode> {
    let patch = body(payload)?;
    match state.update_policy(&patch) {
        Ok(snapshot) => {
            info!("Settings endpoint called - policy updated");
            Ok(Json(snapshot.policy))
        }
        Err(e) => {
            error!("Failed to update settings: {}", e);
            Err(status_for(&e))
        }
    }
}

/// Handle POST /preview - Play an interval cue once
pub async fn preview_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let request = body(payload)?;
    respond(&state, state.preview(request.mode), "Preview played")
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
