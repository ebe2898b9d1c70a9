//! Wake lock background task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::{
    services::{
        wake_lock::{KeepAwakeFallback, ScreenLock},
        WakeLockManager,
    },
    state::{AppState, TimerStatus},
};

/// How often a held lock is checked for a fallback that died on its own
pub const RECHECK_PERIOD: Duration = Duration::from_secs(30);

/// Background task that holds sleep prevention exactly while the timer runs
/// and the display is visible.
///
/// Platform locks are commonly dropped when the display is hidden, so the lock
/// is released on hide and acquired again on reveal. Released for good when
/// shutdown is requested.
pub async fn wake_lock_task<P, F>(state: Arc<AppState>, mut manager: WakeLockManager<P, F>)
where
    P: ScreenLock,
    F: KeepAwakeFallback,
{
    info!("Starting wake lock task");

    let mut state_rx = state.subscribe();
    let mut shutdown_rx = state.shutdown_requested();
    let mut recheck = interval(RECHECK_PERIOD);
    recheck.set_missed_tick_behavior(MissedTickBehavior::Skip);
    recheck.tick().await;

    loop {
        if *shutdown_rx.borrow_and_update() {
            break;
        }
        let wanted = {
            let snapshot = state_rx.borrow_and_update();
            snapshot.status() == TimerStatus::Running && snapshot.visible
        };

        if wanted {
            manager.acquire().await;
        } else {
            manager.release().await;
        }
        state.set_wake_lock_mode(manager.mode());

        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {}
            _ = recheck.tick() => {}
        }
    }

    manager.release().await;
    state.set_wake_lock_mode(manager.mode());
    info!("Wake lock task stopped");
}
