//! Tone collaborator: short beeps

use std::{
    io::{self, Write},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, time::sleep};
use tracing::debug;

use crate::error::NotifyError;

/// Gap between the starts of consecutive beeps
pub const BEEP_SPACING: Duration = Duration::from_millis(120);

/// Quietest volume the bell still rings for
pub const MIN_BELL_GAIN: f32 = 0.25;

/// "Play N beeps at volume V"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneCommand {
    pub beep_count: u32,
    pub volume: Option<f32>,
}

impl ToneCommand {
    pub fn new(beep_count: u32) -> Self {
        Self {
            beep_count: beep_count.max(1),
            volume: None,
        }
    }

    pub fn with_volume(self, volume: f32) -> Self {
        Self {
            volume: Some(volume.clamp(0.0, 1.0)),
            ..self
        }
    }

    /// Effective volume, full scale when unset
    pub fn gain(&self) -> f32 {
        self.volume.unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.beep_count == 0 {
            return Err(NotifyError::InvalidTone("beep count must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.gain()) {
            return Err(NotifyError::InvalidTone(format!(
                "volume {} outside [0, 1]",
                self.gain()
            )));
        }
        Ok(())
    }
}

/// Something that can play a burst of beeps
pub trait ToneSink: Send + Sync {
    fn play(&self, command: ToneCommand) -> Result<(), NotifyError>;
}

/// Rings the terminal bell, one stroke per beep.
///
/// The bell has no volume control: commands quieter than [`MIN_BELL_GAIN`]
/// (the dial drag feedback) are dropped and everything else rings at full
/// strength.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellTone;

impl ToneSink for BellTone {
    fn play(&self, command: ToneCommand) -> Result<(), NotifyError> {
        command.validate()?;
        if command.gain() < MIN_BELL_GAIN {
            debug!("Skipping {} beep(s) at volume {}", command.beep_count, command.gain());
            return Ok(());
        }

        let handle = Handle::try_current()
            .map_err(|e| NotifyError::Rejected(format!("no async runtime: {}", e)))?;

        debug!("Playing {} beep(s)", command.beep_count);
        handle.spawn(async move {
            for i in 0..command.beep_count {
                if i > 0 {
                    sleep(BEEP_SPACING).await;
                }
                let mut stdout = io::stdout();
                if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
                    debug!("Bell write failed: {}", e);
                    break;
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beep_count_is_at_least_one() {
        assert_eq!(ToneCommand::new(0).beep_count, 1);
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(ToneCommand::new(1).with_volume(3.0).volume, Some(1.0));
        assert_eq!(ToneCommand::new(1).with_volume(-1.0).volume, Some(0.0));
    }

    #[test]
    fn hand_built_commands_are_validated() {
        let zero = ToneCommand { beep_count: 0, volume: None };
        assert!(zero.validate().is_err());
        let loud = ToneCommand { beep_count: 2, volume: Some(1.5) };
        assert!(loud.validate().is_err());
        assert!(ToneCommand::new(6).validate().is_ok());
    }

    #[test]
    fn bell_needs_a_runtime() {
        assert!(matches!(
            BellTone.play(ToneCommand::new(1)),
            Err(NotifyError::Rejected(_))
        ));
    }

    #[test]
    fn soft_chime_does_not_ring_the_bell() {
        // no runtime: anything that would ring is rejected
        assert!(BellTone.play(ToneCommand::new(1).with_volume(0.125)).is_ok());
        assert!(matches!(
            BellTone.play(ToneCommand::new(1).with_volume(MIN_BELL_GAIN)),
            Err(NotifyError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn silent_commands_are_accepted() {
        assert!(BellTone.play(ToneCommand::new(3).with_volume(0.0)).is_ok());
    }
}
