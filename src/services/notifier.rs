//! Delivers state machine cues to the tone and speech collaborators

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{state::Cue, utils::Clock};

use super::{speech::announcement, Speaker, ToneSink};

/// Plays cues; failures are logged and swallowed so a quiet channel never
/// stops the timer
#[derive(Clone)]
pub struct Notifier {
    tone: Arc<dyn ToneSink>,
    speaker: Arc<dyn Speaker>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(tone: Arc<dyn ToneSink>, speaker: Arc<dyn Speaker>, clock: Arc<dyn Clock>) -> Self {
        Self { tone, speaker, clock }
    }

    pub fn dispatch(&self, cues: &[Cue]) {
        for cue in cues {
            match cue {
                Cue::Tone(command) => {
                    if let Err(e) = self.tone.play(*command) {
                        warn!("Tone playback failed: {}", e);
                    }
                }
                Cue::SpeakTime => {
                    let now = self.clock.now_ms();
                    let utterance = announcement(now, self.clock.utc_offset_secs(now));
                    if let Err(e) = self.speaker.speak(&utterance) {
                        warn!("Speech playback failed: {}", e);
                    }
                }
                Cue::CancelSpeech => {
                    debug!("Cancelling speech");
                    self.speaker.cancel();
                }
            }
        }
    }
}
