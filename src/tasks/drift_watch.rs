//! Wall-clock drift watchdog background task

use std::{sync::Arc, time::Duration};

use tokio::time::{interval, Instant};
use tracing::{info, warn};

use crate::state::AppState;

/// How often the two clocks are compared
pub const CHECK_PERIOD: Duration = Duration::from_secs(15);
/// Divergence treated as a suspend or a clock step
pub const DRIFT_THRESHOLD_MS: i64 = 2_000;

/// Difference between wall-clock and monotonic progress over one period
pub fn clock_drift_ms(wall_elapsed_ms: i64, monotonic_elapsed: Duration) -> i64 {
    wall_elapsed_ms - monotonic_elapsed.as_millis() as i64
}

/// Background task that detects system suspend or wall-clock steps.
///
/// The monotonic clock used for sleeping does not advance while the machine
/// is suspended, so a timer armed before a suspend would fire late by the
/// suspended time. When the wall clock runs away from the monotonic clock the
/// current state is republished and every task plans again from scratch.
pub async fn drift_watch_task(state: Arc<AppState>) {
    info!("Starting drift watch task");

    let mut ticker = interval(CHECK_PERIOD);
    ticker.tick().await;
    let mut last_wall = state.now_ms();
    let mut last_mono = Instant::now();

    loop {
        ticker.tick().await;

        let wall = state.now_ms();
        let mono = Instant::now();
        let drift = clock_drift_ms(wall - last_wall, mono.duration_since(last_mono));
        last_wall = wall;
        last_mono = mono;

        if drift.abs() > DRIFT_THRESHOLD_MS {
            info!("Wall clock moved {}ms against the monotonic clock, resynchronising", drift);
            if let Err(e) = state.resync() {
                warn!("Failed to resynchronise timer state: {}", e);
            }
        }
    }
}
