//! Beepbeep - A drift-free interval timer daemon
//!
//! This library provides a countdown timer whose remaining time is always
//! derived from the wall clock, with audio alerts aligned to real clock
//! boundaries, a throttled display loop, sleep prevention while running and
//! a gate for synthesized speech.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{NotifyError, SettingsError, TimerError, WakeLockError};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
