//! External collaborator module
//!
//! This module contains the tone, speech, settings and sleep prevention
//! collaborators, plus the notifier that feeds cues to them.

pub mod notifier;
pub mod settings_store;
pub mod speech;
pub mod tone;
pub mod wake_lock;

// Re-export main types
pub use notifier::Notifier;
pub use settings_store::{JsonFileStore, MemoryStore, SettingsStore};
pub use speech::{EspeakSpeaker, Speaker};
pub use tone::{BellTone, ToneCommand, ToneSink};
pub use wake_lock::{InhibitorLock, SilentAudioLoop, WakeLockManager, WakeLockMode};
