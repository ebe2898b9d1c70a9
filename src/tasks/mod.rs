//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod audio_scheduler;
pub mod drift_watch;
pub mod visual_loop;
pub mod wake_lock;

// Re-export main functions
pub use audio_scheduler::{audio_scheduler_task, ArmedTimer};
pub use drift_watch::drift_watch_task;
pub use visual_loop::visual_update_task;
pub use wake_lock::wake_lock_task;
