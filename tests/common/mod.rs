//! Shared harness for integration tests: a wall clock driven by tokio's
//! paused clock plus collaborators that record what they were asked to do.
#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use beepbeep::{
    error::NotifyError,
    services::{MemoryStore, Notifier, Speaker, ToneCommand, ToneSink},
    state::{
        AppState, Collaborators, Display, DisplayFrame, NotificationPolicy, TimerMachine,
    },
    tasks::{audio_scheduler_task, drift_watch_task, visual_update_task},
    utils::Clock,
};
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::time::Instant;

/// Epoch milliseconds for a UTC time of day on a fixed date
pub fn at(h: u32, m: u32, s: u32) -> i64 {
    let naive = NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .unwrap();
    Utc.from_utc_datetime(&naive).timestamp_millis()
}

/// Wall clock that advances with tokio's (paused) clock and can be stepped
/// independently of it, like an NTP correction or a resume from suspend
pub struct PausedClock {
    base_ms: AtomicI64,
    origin: Instant,
    offset_secs: i32,
}

impl PausedClock {
    pub fn new(base_ms: i64) -> Self {
        Self {
            base_ms: AtomicI64::new(base_ms),
            origin: Instant::now(),
            offset_secs: 0,
        }
    }

    /// Move the wall clock without moving tokio's clock
    pub fn step(&self, delta_ms: i64) {
        self.base_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for PausedClock {
    fn now_ms(&self) -> i64 {
        self.base_ms.load(Ordering::SeqCst) + self.origin.elapsed().as_millis() as i64
    }

    fn utc_offset_secs(&self, _at_ms: i64) -> i32 {
        self.offset_secs
    }
}

pub struct RecordingTone {
    clock: Arc<PausedClock>,
    played: Mutex<Vec<(i64, ToneCommand)>>,
}

impl ToneSink for RecordingTone {
    fn play(&self, command: ToneCommand) -> Result<(), NotifyError> {
        self.played.lock().unwrap().push((self.clock.now_ms(), command));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
    pub cancels: AtomicUsize,
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, utterance: &str) -> Result<(), NotifyError> {
        self.spoken.lock().unwrap().push(utterance.to_string());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct RecordingDisplay {
    initial: DisplayFrame,
    frames: Mutex<Vec<DisplayFrame>>,
}

impl RecordingDisplay {
    pub fn render_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}

impl Display for RecordingDisplay {
    fn render(&self, frame: DisplayFrame) {
        self.frames.lock().unwrap().push(frame);
    }

    fn latest(&self) -> DisplayFrame {
        self.frames.lock().unwrap().last().copied().unwrap_or(self.initial)
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub clock: Arc<PausedClock>,
    pub tone: Arc<RecordingTone>,
    pub speaker: Arc<RecordingSpeaker>,
    pub display: Arc<RecordingDisplay>,
    pub settings: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(base_ms: i64, duration_ms: i64, policy: NotificationPolicy) -> Self {
        let clock = Arc::new(PausedClock::new(base_ms));
        let tone = Arc::new(RecordingTone {
            clock: Arc::clone(&clock),
            played: Mutex::new(Vec::new()),
        });
        let speaker = Arc::new(RecordingSpeaker::default());
        let display = Arc::new(RecordingDisplay {
            initial: DisplayFrame::from_remaining_ms(duration_ms),
            frames: Mutex::new(Vec::new()),
        });
        let settings = Arc::new(MemoryStore::default());

        let notifier = Notifier::new(tone.clone(), speaker.clone(), clock.clone());
        let state = Arc::new(AppState::new(
            TimerMachine::new(duration_ms, policy),
            Collaborators {
                clock: clock.clone(),
                notifier,
                display: display.clone(),
                settings: settings.clone(),
            },
            20554,
            "127.0.0.1".to_string(),
        ));

        Self {
            state,
            clock,
            tone,
            speaker,
            display,
            settings,
        }
    }

    /// Spawn the audio scheduler and the visual loop
    pub fn spawn_tasks(&self) {
        tokio::spawn(audio_scheduler_task(Arc::clone(&self.state)));
        tokio::spawn(visual_update_task(Arc::clone(&self.state)));
    }

    /// Spawn the wall-clock drift watchdog
    pub fn spawn_drift_watch(&self) {
        tokio::spawn(drift_watch_task(Arc::clone(&self.state)));
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Beep counts of every tone played so far
    pub fn beeps(&self) -> Vec<u32> {
        self.tone
            .played
            .lock()
            .unwrap()
            .iter()
            .map(|(_, command)| command.beep_count)
            .collect()
    }

    /// Wall-clock instants at which tones were played
    pub fn tone_times(&self) -> Vec<i64> {
        self.tone.played.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

/// Quiet policy: no chime, no interval, no auto-restart
pub fn quiet_policy() -> NotificationPolicy {
    NotificationPolicy {
        auto_restart: false,
        interval_minutes: beepbeep::state::IntervalMinutes::OFF,
        interval_mode: beepbeep::state::IntervalMode::Beep,
        ui_chime_enabled: false,
    }
}

/// Let spawned tasks run, moving the paused clock forward by `duration`
pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Let spawned tasks react without moving the clock noticeably
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
