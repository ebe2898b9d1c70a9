//! Visual update loop background task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::{AppState, TimerStatus};

/// Refresh period of the display while running (4 Hz)
pub const FRAME_PERIOD: Duration = Duration::from_millis(250);

fn render(state: &AppState) {
    if let Err(e) = state.render_frame() {
        warn!("Failed to render display frame: {}", e);
    }
}

/// Background task that refreshes the display while running and visible.
///
/// Every snapshot change renders one fresh frame immediately. The repeating
/// ticker only exists while the timer runs and the display is visible; when
/// the host hides the display it is dropped, and revealing it again starts
/// from a freshly computed frame. Completion is never decided here.
pub async fn visual_update_task(state: Arc<AppState>) {
    info!("Starting visual update task");

    let mut state_rx = state.subscribe();

    loop {
        let animate = {
            let snapshot = state_rx.borrow_and_update();
            snapshot.status() == TimerStatus::Running && snapshot.visible
        };
        render(&state);

        if !animate {
            if state_rx.changed().await.is_err() {
                break;
            }
            continue;
        }

        debug!("Visual loop running");
        let mut ticker = interval(FRAME_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately and the frame was just drawn
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        info!("Visual update task stopped");
                        return;
                    }
                    break;
                }
                _ = ticker.tick() => render(&state),
            }
        }
        debug!("Visual loop suspended");
    }

    info!("Visual update task stopped");
}
