//! Display collaborator: what the dial and digits consume

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::elapsed;

/// One rendered frame of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFrame {
    pub remaining_seconds: u64,
    pub percentage: f64,
}

impl DisplayFrame {
    pub fn from_remaining_ms(remaining_ms: i64) -> Self {
        Self {
            remaining_seconds: elapsed::remaining_seconds(remaining_ms),
            percentage: elapsed::percentage(remaining_ms),
        }
    }

    /// `MM:SS` as shown on the digital display
    pub fn formatted(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}

/// Sink for rendered frames
pub trait Display: Send + Sync {
    fn render(&self, frame: DisplayFrame);

    /// Frame currently shown
    fn latest(&self) -> DisplayFrame;
}

/// Display backed by a watch channel; readers always see the latest frame
#[derive(Debug)]
pub struct WatchDisplay {
    tx: watch::Sender<DisplayFrame>,
}

impl WatchDisplay {
    pub fn new(initial: DisplayFrame) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }
}

impl Display for WatchDisplay {
    fn render(&self, frame: DisplayFrame) {
        tracing::trace!("Rendering {} ({:.2}%)", frame.formatted(), frame.percentage);
        self.tx.send_replace(frame);
    }

    fn latest(&self) -> DisplayFrame {
        *self.tx.borrow()
    }
}
