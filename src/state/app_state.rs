//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::TimerError,
    services::{settings_store, Notifier, SettingsStore, WakeLockMode},
    utils::Clock,
};

use super::{
    Cue, Display, DisplayFrame, IntervalMode, PolicyPatch, ScheduledEvent, TimerMachine,
    TimerSnapshot,
};

/// Collaborators the application state drives
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub notifier: Notifier,
    pub display: Arc<dyn Display>,
    pub settings: Arc<dyn SettingsStore>,
}

/// Shared application state.
///
/// Every interaction goes through here: the machine is mutated under its
/// lock, the resulting snapshot is published to the background tasks, and
/// the requested cues are played once the lock is released.
pub struct AppState {
    machine: Mutex<TimerMachine>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    display: Arc<dyn Display>,
    settings: Arc<dyn SettingsStore>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    wake_lock_mode: Mutex<WakeLockMode>,
    /// Latest snapshot for the scheduler, visual loop and wake lock tasks
    snapshot_tx: watch::Sender<TimerSnapshot>,
    shutdown_tx: watch::Sender<bool>,
}

impl AppState {
    pub fn new(machine: TimerMachine, collaborators: Collaborators, port: u16, host: String) -> Self {
        let (snapshot_tx, _) = watch::channel(machine.snapshot());
        let (shutdown_tx, _) = watch::channel(false);
        let Collaborators {
            clock,
            notifier,
            display,
            settings,
        } = collaborators;

        Self {
            machine: Mutex::new(machine),
            clock,
            notifier,
            display,
            settings,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            wake_lock_mode: Mutex::new(WakeLockMode::Released),
            snapshot_tx,
            shutdown_tx,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn utc_offset_secs(&self, at_ms: i64) -> i32 {
        self.clock.utc_offset_secs(at_ms)
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        Ok(self.lock_machine()?.snapshot())
    }

    /// Run a transition on the machine, publish the result and play its cues
    fn apply<F>(&self, action: &str, transition: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&mut TimerMachine, i64) -> Result<Vec<Cue>, TimerError>,
    {
        let now = self.now_ms();
        let mut machine = self.lock_machine()?;
        let cues = transition(&mut machine, now)?;
        let snapshot = machine.snapshot();
        drop(machine); // Release the lock early

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }

        self.snapshot_tx.send_replace(snapshot.clone());
        self.notifier.dispatch(&cues);
        Ok(snapshot)
    }

    /// Display tapped: start, pause or resume
    pub fn tap(&self) -> Result<TimerSnapshot, TimerError> {
        self.apply("tap", |machine, now| Ok(machine.tap(now)))
    }

    /// Dial released or preset picked
    pub fn change_duration(&self, minutes: u32) -> Result<TimerSnapshot, TimerError> {
        let snapshot = self.apply("duration", |machine, now| machine.change_duration(minutes, now))?;
        settings_store::save_duration_ms(self.settings.as_ref(), snapshot.session.total_duration_ms());
        Ok(snapshot)
    }

    /// Dial moving under the pointer; feedback only
    pub fn dial_moved(&self) -> Result<(), TimerError> {
        let cues = self.lock_machine()?.dial_moved();
        self.notifier.dispatch(&cues);
        Ok(())
    }

    pub fn update_policy(&self, patch: &PolicyPatch) -> Result<TimerSnapshot, TimerError> {
        let snapshot = self.apply("settings", |machine, _| Ok(machine.update_policy(patch)))?;
        settings_store::save_policy(self.settings.as_ref(), &snapshot.policy);
        Ok(snapshot)
    }

    pub fn preview(&self, mode: IntervalMode) -> Result<TimerSnapshot, TimerError> {
        self.apply("preview", |machine, _| Ok(machine.preview(mode)))
    }

    /// Host visibility changed
    pub fn set_visible(&self, visible: bool) -> Result<TimerSnapshot, TimerError> {
        let mut machine = self.lock_machine()?;
        let changed = machine.set_visible(visible);
        let snapshot = machine.snapshot();
        drop(machine);

        if changed {
            self.snapshot_tx.send_replace(snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Deliver a fired scheduler event to the machine
    pub fn handle_fire(&self, event: ScheduledEvent) -> Result<TimerSnapshot, TimerError> {
        self.apply("scheduler", |machine, now| machine.fire(event, now))
    }

    /// Republish the current snapshot so every task recomputes from scratch
    pub fn resync(&self) -> Result<(), TimerError> {
        let snapshot = self.snapshot()?;
        self.snapshot_tx.send_replace(snapshot);
        info!("Timer state resynchronised");
        Ok(())
    }

    /// Fresh frame for the current instant
    pub fn display_frame(&self) -> Result<DisplayFrame, TimerError> {
        let now = self.now_ms();
        Ok(self.snapshot()?.display_frame(now))
    }

    /// Recompute the frame and push it to the display
    pub fn render_frame(&self) -> Result<DisplayFrame, TimerError> {
        let frame = self.display_frame()?;
        self.display.render(frame);
        Ok(frame)
    }

    /// Frame the display is currently showing
    pub fn shown_frame(&self) -> DisplayFrame {
        self.display.latest()
    }

    pub fn wake_lock_mode(&self) -> WakeLockMode {
        self.wake_lock_mode
            .lock()
            .map(|mode| *mode)
            .unwrap_or_default()
    }

    pub fn set_wake_lock_mode(&self, mode: WakeLockMode) {
        match self.wake_lock_mode.lock() {
            Ok(mut current) => *current = mode,
            Err(e) => warn!("Failed to record wake lock mode: {}", e),
        }
    }

    /// Ask long-running tasks to wind down
    pub fn begin_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn shutdown_requested(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }

    fn lock_machine(&self) -> Result<MutexGuard<'_, TimerMachine>, TimerError> {
        self.machine
            .lock()
            .map_err(|e| TimerError::Lock(e.to_string()))
    }
}
