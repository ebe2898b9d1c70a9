//! Speech collaborator: spoken time announcements

use std::{process::Stdio, sync::Mutex};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::NotifyError;

/// Something that can say a sentence out loud
pub trait Speaker: Send + Sync {
    /// Start speaking `utterance`, replacing anything still being spoken
    fn speak(&self, utterance: &str) -> Result<(), NotifyError>;

    /// Stop the current utterance, if any
    fn cancel(&self);
}

/// Sentence announcing the local time at `at_ms`, e.g. "The time is 3:05 PM"
pub fn announcement(at_ms: i64, utc_offset_secs: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());
    let local = DateTime::from_timestamp_millis(at_ms)
        .unwrap_or_default()
        .with_timezone(&offset);
    format!("The time is {}", local.format("%-I:%M %p"))
}

/// Speaks through an `espeak-ng` compatible program
#[derive(Debug)]
pub struct EspeakSpeaker {
    program: String,
    voice: Option<String>,
    current: Mutex<Option<Child>>,
}

impl EspeakSpeaker {
    /// Probe the program for an English voice and fall back to its default
    /// voice when none is listed.
    pub async fn detect(program: &str) -> Self {
        let voice = match Command::new(program).arg("--voices=en").output().await {
            Ok(output) if output.status.success() => {
                let listing = String::from_utf8_lossy(&output.stdout);
                // first line is the column header
                if listing.lines().skip(1).any(|line| !line.trim().is_empty()) {
                    Some("en".to_string())
                } else {
                    None
                }
            }
            Ok(output) => {
                warn!("{} --voices failed with {}", program, output.status);
                None
            }
            Err(e) => {
                warn!("Speech program {} unavailable: {}", program, e);
                None
            }
        };

        info!("Speech via {} (voice: {})", program, voice.as_deref().unwrap_or("default"));
        Self::new(program, voice)
    }

    pub fn new(program: &str, voice: Option<String>) -> Self {
        Self {
            program: program.to_string(),
            voice,
            current: Mutex::new(None),
        }
    }
}

impl Speaker for EspeakSpeaker {
    fn speak(&self, utterance: &str) -> Result<(), NotifyError> {
        self.cancel();

        let mut command = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            command.args(["-v", voice]);
        }
        let child = command
            .arg(utterance)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        debug!("Speaking: {}", utterance);
        let mut current = self
            .current
            .lock()
            .map_err(|e| NotifyError::Rejected(format!("speaker lock poisoned: {}", e)))?;
        *current = Some(child);
        Ok(())
    }

    fn cancel(&self) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        if let Some(mut child) = current.take() {
            if child.start_kill().is_ok() {
                debug!("Cancelled utterance in progress");
            }
        }
    }
}
