//! One-shot latch for synthesized speech

/// Tracks whether a qualifying user gesture has happened.
///
/// Many platforms drop speech that was not preceded by a user gesture. The
/// first gesture opens the gate for the rest of the process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpeechGate {
    unlocked: bool,
}

impl SpeechGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a gesture. Returns `true` only for the call that opened the gate,
    /// in which case the caller must issue the unlocking utterance.
    pub fn register_gesture(&mut self) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        true
    }

    pub fn permits(&self) -> bool {
        self.unlocked
    }
}
