//! State management module
//!
//! This module contains the timer session, its notification policy, the
//! state machine that owns both, and the shared application state.

pub mod app_state;
pub mod display;
pub mod elapsed;
pub mod machine;
pub mod policy;
pub mod schedule;
pub mod session;
pub mod speech_gate;

// Re-export main types
pub use app_state::{AppState, Collaborators};
pub use display::{Display, DisplayFrame, WatchDisplay};
pub use machine::{Cue, TimerMachine, TimerSnapshot};
pub use policy::{IntervalMinutes, IntervalMode, NotificationPolicy, PolicyPatch};
pub use schedule::{EventKind, ScheduledEvent};
pub use session::{SessionView, TimerSession, TimerStatus};
pub use speech_gate::SpeechGate;
