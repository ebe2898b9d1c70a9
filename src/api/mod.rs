//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.
//! It plays the part of the display: it emits interaction events and reads
//! rendered frames.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tap", post(tap_handler))
        .route("/duration", post(duration_handler))
        .route("/dial", post(dial_handler))
        .route("/visibility", post(visibility_handler))
        .route("/display", get(display_handler))
        .route("/status", get(status_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/preview", post(preview_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
