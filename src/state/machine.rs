//! Timer state machine
//!
//! `TimerMachine` is the only writer of the session, the notification policy
//! and the speech gate. Every operation takes the current wall-clock instant
//! explicitly and returns the cues the caller has to play; nothing here
//! touches a clock, a timer or a speaker.

use tracing::{debug, info};

use crate::{error::TimerError, services::tone::ToneCommand};

use super::{
    schedule::{EventKind, ScheduledEvent},
    DisplayFrame, IntervalMode, NotificationPolicy, PolicyPatch, SpeechGate, TimerSession,
    TimerStatus,
};

/// Beeps in the completion cue
pub const COMPLETION_BEEPS: u32 = 6;
/// Beeps in the recurring interval cue
pub const INTERVAL_BEEPS: u32 = 2;
/// Volume of the feedback chime while the dial is dragged
pub const DRAG_CHIME_VOLUME: f32 = 0.125;

const MINUTE_MS: i64 = 60_000;
const MAX_DIAL_MINUTES: u32 = 60;

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Tone(ToneCommand),
    /// Announce the current local time
    SpeakTime,
    /// Stop any utterance still playing
    CancelSpeech,
}

/// Read-only copy of everything the other components look at
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub session: TimerSession,
    pub policy: NotificationPolicy,
    /// Bumped on every change that affects scheduling
    pub revision: u64,
    pub visible: bool,
    pub speech_unlocked: bool,
}

impl TimerSnapshot {
    pub fn status(&self) -> TimerStatus {
        self.session.status()
    }

    pub fn display_frame(&self, now_ms: i64) -> DisplayFrame {
        DisplayFrame::from_remaining_ms(self.session.remaining_ms(now_ms))
    }
}

#[derive(Debug, Clone)]
pub struct TimerMachine {
    session: TimerSession,
    policy: NotificationPolicy,
    gate: SpeechGate,
    revision: u64,
    visible: bool,
}

impl TimerMachine {
    pub fn new(total_duration_ms: i64, policy: NotificationPolicy) -> Self {
        Self {
            session: TimerSession::new(total_duration_ms),
            policy,
            gate: SpeechGate::new(),
            revision: 0,
            visible: true,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            session: self.session.clone(),
            policy: self.policy,
            revision: self.revision,
            visible: self.visible,
            speech_unlocked: self.gate.permits(),
        }
    }

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn policy(&self) -> &NotificationPolicy {
        &self.policy
    }

    pub fn status(&self) -> TimerStatus {
        self.session.status()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.session.remaining_ms(now_ms)
    }

    /// `IDLE -> RUNNING`
    pub fn start(&mut self, now_ms: i64) -> Result<Vec<Cue>, TimerError> {
        self.expect_status(TimerStatus::Idle, "start")?;
        self.session.run_from(now_ms);
        self.bump();
        info!("Timer started for {}ms", self.session.total_duration_ms());
        Ok(Vec::new())
    }

    /// `RUNNING -> PAUSED`, snapshotting the remaining time
    pub fn pause(&mut self, now_ms: i64) -> Result<Vec<Cue>, TimerError> {
        self.expect_status(TimerStatus::Running, "pause")?;
        let remaining = self.session.remaining_ms(now_ms);
        self.session.pause_with(remaining);
        self.bump();
        info!("Timer paused with {}ms remaining", remaining);
        Ok(vec![Cue::CancelSpeech])
    }

    /// `PAUSED -> RUNNING`, shifting the start so elapsed time is preserved
    pub fn resume(&mut self, now_ms: i64) -> Result<Vec<Cue>, TimerError> {
        self.expect_status(TimerStatus::Paused, "resume")?;
        let remaining = self.session.paused_remaining_ms().unwrap_or(0);
        let elapsed = self.session.total_duration_ms() - remaining;
        self.session.run_from(now_ms - elapsed);
        self.bump();
        info!("Timer resumed with {}ms remaining", remaining);
        Ok(Vec::new())
    }

    /// Display tapped: chime, register the gesture, then toggle
    pub fn tap(&mut self, now_ms: i64) -> Vec<Cue> {
        let mut cues: Vec<Cue> = self.chime(None).into_iter().collect();

        let toggled = match self.status() {
            TimerStatus::Running => self.pause(now_ms),
            TimerStatus::Paused => self.resume(now_ms),
            TimerStatus::Idle => self.start(now_ms),
        };
        // the match above always picks the transition valid for the status
        cues.extend(toggled.unwrap_or_default());

        if self.policy.interval_mode == IntervalMode::Speech && self.gate.register_gesture() {
            debug!("Speech gate opened by display tap");
            cues.push(Cue::SpeakTime);
        }
        cues
    }

    /// Dial released or preset picked. `0` minutes is the 12 o'clock
    /// position and means a full hour. Always (re)starts the session.
    pub fn change_duration(&mut self, minutes: u32, now_ms: i64) -> Result<Vec<Cue>, TimerError> {
        if minutes > MAX_DIAL_MINUTES {
            return Err(TimerError::InvalidDuration(minutes));
        }
        let minutes = if minutes == 0 { MAX_DIAL_MINUTES } else { minutes };

        self.session.set_total_duration_ms(i64::from(minutes) * MINUTE_MS);
        self.session.run_from(now_ms);
        self.bump();
        info!("Duration set to {} minutes, timer restarted", minutes);

        let mut cues = vec![Cue::CancelSpeech];
        cues.extend(self.chime(None));
        Ok(cues)
    }

    /// Soft feedback while the dial is being dragged
    pub fn dial_moved(&self) -> Vec<Cue> {
        self.chime(Some(DRAG_CHIME_VOLUME)).into_iter().collect()
    }

    /// Apply a settings change
    pub fn update_policy(&mut self, patch: &PolicyPatch) -> Vec<Cue> {
        if patch.is_empty() {
            return Vec::new();
        }
        let previous = self.policy;
        self.policy = previous.patched(patch);
        self.bump();
        info!("Notification policy updated: {:?}", self.policy);

        let mut cues: Vec<Cue> = self.chime(None).into_iter().collect();
        let speech_enabled = previous.interval_mode != IntervalMode::Speech
            && self.policy.interval_mode == IntervalMode::Speech;
        if speech_enabled && self.gate.register_gesture() {
            debug!("Speech gate opened by enabling speech mode");
            cues.push(Cue::SpeakTime);
        }
        cues
    }

    /// Play the interval cue of `mode` once
    pub fn preview(&mut self, mode: IntervalMode) -> Vec<Cue> {
        match mode {
            IntervalMode::Beep => vec![Cue::Tone(ToneCommand::new(INTERVAL_BEEPS))],
            IntervalMode::Speech => {
                if self.gate.register_gesture() {
                    debug!("Speech gate opened by preview");
                }
                vec![Cue::SpeakTime]
            }
        }
    }

    /// Handle a fired scheduler event
    pub fn fire(&mut self, event: ScheduledEvent, now_ms: i64) -> Result<Vec<Cue>, TimerError> {
        if event.revision != self.revision || self.status() != TimerStatus::Running {
            return Err(TimerError::StaleEvent {
                event: event.revision,
                current: self.revision,
            });
        }

        match event.kind {
            EventKind::Completion => {
                let cues = vec![Cue::Tone(ToneCommand::new(COMPLETION_BEEPS))];
                if self.policy.auto_restart {
                    self.session.run_from(now_ms);
                    info!("Timer completed, looping");
                } else {
                    self.session.reset();
                    info!("Timer completed");
                }
                self.bump();
                Ok(cues)
            }
            EventKind::Interval => match self.policy.interval_mode {
                IntervalMode::Beep => Ok(vec![Cue::Tone(ToneCommand::new(INTERVAL_BEEPS))]),
                IntervalMode::Speech if self.gate.permits() => Ok(vec![Cue::SpeakTime]),
                IntervalMode::Speech => {
                    debug!("Interval announcement skipped, speech gate still closed");
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Host visibility changed. Returns whether anything changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        debug!("Visibility changed: visible={}", visible);
        true
    }

    fn chime(&self, volume: Option<f32>) -> Option<Cue> {
        self.policy.ui_chime_enabled.then(|| {
            let tone = ToneCommand::new(1);
            Cue::Tone(match volume {
                Some(volume) => tone.with_volume(volume),
                None => tone,
            })
        })
    }

    fn expect_status(&self, expected: TimerStatus, action: &'static str) -> Result<(), TimerError> {
        let from = self.status();
        if from == expected {
            Ok(())
        } else {
            Err(TimerError::InvalidTransition { from, action })
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
