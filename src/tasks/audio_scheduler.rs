//! Audio event scheduler background task
//!
//! Exactly one deferred callback is armed at a time: the next interval
//! boundary or the completion instant, whichever comes first. It is planned
//! from the wall clock on every pass, so a late or throttled wake-up corrects
//! itself on the next plan instead of accumulating drift.

use std::{future::pending, pin::Pin, sync::Arc, time::Duration};

use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};

use crate::state::{schedule::next_event_after, AppState, EventKind, ScheduledEvent};

/// Owner of the single armed audio timer.
///
/// Arming always cancels what was armed before, so two timers can never be
/// pending at the same time.
#[derive(Debug, Default)]
pub struct ArmedTimer {
    event: Option<ScheduledEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ArmedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is armed with `event`, due after `delay`
    pub fn arm(&mut self, event: ScheduledEvent, delay: Duration) {
        if let Some(previous) = self.cancel() {
            if previous != event {
                debug!("Re-arming: {:?} replaced by {:?}", previous, event);
            }
        }
        self.event = Some(event);
        self.sleep = Some(Box::pin(sleep(delay)));
    }

    /// Disarm, returning the event that was pending
    pub fn cancel(&mut self) -> Option<ScheduledEvent> {
        self.sleep = None;
        self.event.take()
    }

    pub fn is_armed(&self) -> bool {
        self.event.is_some()
    }

    pub fn armed_event(&self) -> Option<ScheduledEvent> {
        self.event
    }

    /// Wait for the armed event and disarm it. Never resolves while nothing
    /// is armed. Cancel safe: dropping the future keeps the timer armed.
    pub async fn fired(&mut self) -> Option<ScheduledEvent> {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().await,
            None => pending::<()>().await,
        }
        self.sleep = None;
        self.event.take()
    }
}

/// Plan and arm the next event for the current state. `last_interval` is the
/// last interval event that fired; it only counts for the revision it was
/// planned against.
fn rearm(state: &AppState, armed: &mut ArmedTimer, last_interval: &mut Option<ScheduledEvent>) {
    let snapshot = match state.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to read timer state: {}", e);
            armed.cancel();
            return;
        }
    };

    if last_interval.is_some_and(|event| event.revision != snapshot.revision) {
        *last_interval = None;
    }
    let last_boundary = last_interval.map(|event| event.fire_at_ms);

    let now = state.now_ms();
    match next_event_after(now, &snapshot, state.utc_offset_secs(now), last_boundary) {
        Some(event) => {
            let delay = event.delay_ms(now);
            debug!("Next {:?} event in {}ms", event.kind, delay);
            armed.arm(event, Duration::from_millis(delay));
        }
        None => {
            if let Some(cancelled) = armed.cancel() {
                debug!("Disarmed {:?} event", cancelled.kind);
            }
        }
    }
}

/// Background task that keeps exactly one audio event armed while running
pub async fn audio_scheduler_task(state: Arc<AppState>) {
    info!("Starting audio scheduler task");

    let mut state_rx = state.subscribe();
    let mut armed = ArmedTimer::new();
    let mut last_interval = None;

    loop {
        let _ = state_rx.borrow_and_update();
        rearm(&state, &mut armed, &mut last_interval);

        tokio::select! {
            biased;

            Some(event) = armed.fired() => {
                debug!("{:?} event fired", event.kind);
                // A change racing with the fire wins: the machine rejects the
                // outdated event and the next pass plans from the new state.
                match state.handle_fire(event) {
                    Ok(_) if event.kind == EventKind::Interval => last_interval = Some(event),
                    Ok(_) => {}
                    Err(e) => warn!("Discarded scheduler event: {}", e),
                }
            }

            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    armed.cancel();
    info!("Audio scheduler task stopped");
}
