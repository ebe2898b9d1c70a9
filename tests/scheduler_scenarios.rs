//! End-to-end timing scenarios on tokio's paused clock

mod common;

use std::time::Duration;

use beepbeep::state::{Display, IntervalMinutes, IntervalMode, NotificationPolicy, PolicyPatch, TimerStatus};
use common::{advance, at, quiet_policy, settle, Harness};

#[tokio::test(start_paused = true)]
async fn one_minute_session_completes_once_and_resets() {
    let h = Harness::new(at(9, 0, 0), 60_000, quiet_policy());
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(61)).await;

    assert_eq!(h.beeps(), vec![6]);
    let snapshot = h.state.snapshot().unwrap();
    assert_eq!(snapshot.status(), TimerStatus::Idle);
    assert_eq!(snapshot.session.remaining_ms(h.now_ms()), 60_000);

    // nothing else is armed once idle
    advance(Duration::from_secs(600)).await;
    assert_eq!(h.beeps(), vec![6]);
}

#[tokio::test(start_paused = true)]
async fn auto_restart_loops_with_a_rebased_start() {
    let policy = NotificationPolicy {
        auto_restart: true,
        ..quiet_policy()
    };
    let base = at(9, 0, 0);
    let h = Harness::new(base, 60_000, policy);
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(61)).await;

    assert_eq!(h.beeps(), vec![6]);
    let snapshot = h.state.snapshot().unwrap();
    assert_eq!(snapshot.status(), TimerStatus::Running);
    let start = snapshot.session.start_timestamp().unwrap();
    assert!((start - (base + 60_000)).abs() <= 1, "start rebased to {}", start);

    advance(Duration::from_secs(60)).await;
    assert_eq!(h.beeps(), vec![6, 6]);
}

#[tokio::test(start_paused = true)]
async fn interval_alerts_follow_the_wall_clock() {
    let policy = NotificationPolicy {
        interval_minutes: IntervalMinutes::new(5).unwrap(),
        ..quiet_policy()
    };
    let h = Harness::new(at(10, 2, 0), 20 * 60_000, policy);
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(3 * 60 + 1)).await;

    assert_eq!(h.beeps(), vec![2]);
    let first = h.tone_times()[0];
    assert!((first - at(10, 5, 0)).abs() <= 1, "first alert at {}", first);

    // 10:10, 10:15, 10:20, then completion at 10:22
    advance(Duration::from_secs(17 * 60)).await;
    assert_eq!(h.beeps(), vec![2, 2, 2, 2, 6]);
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn disabling_the_interval_cancels_the_armed_alert() {
    let policy = NotificationPolicy {
        interval_minutes: IntervalMinutes::new(5).unwrap(),
        ..quiet_policy()
    };
    let h = Harness::new(at(10, 2, 0), 20 * 60_000, policy);
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(60)).await;
    h.state
        .update_policy(&PolicyPatch {
            interval_minutes: Some(IntervalMinutes::OFF),
            ..Default::default()
        })
        .unwrap();

    advance(Duration::from_secs(10 * 60)).await;
    assert!(h.beeps().is_empty());

    advance(Duration::from_secs(10 * 60)).await;
    assert_eq!(h.beeps(), vec![6]);
}

#[tokio::test(start_paused = true)]
async fn pause_disarms_and_resume_keeps_the_remaining_time() {
    let h = Harness::new(at(9, 0, 0), 60_000, quiet_policy());
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(20)).await;
    h.state.tap().unwrap();
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Paused);

    // paused long past the original completion
    advance(Duration::from_secs(300)).await;
    assert!(h.beeps().is_empty());

    h.state.tap().unwrap();
    let remaining = h.state.snapshot().unwrap().session.remaining_ms(h.now_ms());
    assert_eq!(remaining, 40_000);

    advance(Duration::from_secs(41)).await;
    assert_eq!(h.beeps(), vec![6]);
}

#[tokio::test(start_paused = true)]
async fn hidden_display_resynchronises_on_reveal() {
    let h = Harness::new(at(9, 0, 0), 20 * 60_000, quiet_policy());
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(1)).await;
    assert!(h.display.render_count() >= 4);

    h.state.set_visible(false).unwrap();
    settle().await;
    let renders_when_hidden = h.display.render_count();
    let shown_when_hidden = h.display.latest();

    advance(Duration::from_secs(10 * 60)).await;
    assert_eq!(h.display.render_count(), renders_when_hidden);
    assert_eq!(h.display.latest(), shown_when_hidden);

    h.state.set_visible(true).unwrap();
    settle().await;
    let frame = h.display.latest();
    assert_eq!(frame.remaining_seconds, 599);
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Running);
}

#[tokio::test(start_paused = true)]
async fn completion_still_sounds_while_hidden() {
    let h = Harness::new(at(9, 0, 0), 60_000, quiet_policy());
    h.spawn_tasks();

    h.state.tap().unwrap();
    h.state.set_visible(false).unwrap();
    advance(Duration::from_secs(61)).await;

    assert_eq!(h.beeps(), vec![6]);
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn spoken_alerts_wait_for_the_speech_gate() {
    let policy = NotificationPolicy {
        interval_minutes: IntervalMinutes::new(1).unwrap(),
        interval_mode: IntervalMode::Speech,
        ..quiet_policy()
    };
    let h = Harness::new(at(10, 0, 30), 10 * 60_000, policy);
    h.spawn_tasks();

    // duration change is not a qualifying gesture
    h.state.change_duration(10).unwrap();
    advance(Duration::from_secs(60)).await;
    assert!(h.speaker.spoken.lock().unwrap().is_empty());

    // a tap pauses, opens the gate and speaks once; the next tap resumes
    h.state.tap().unwrap();
    assert_eq!(h.speaker.spoken.lock().unwrap().len(), 1);
    h.state.tap().unwrap();

    advance(Duration::from_secs(60)).await;
    let spoken = h.speaker.spoken.lock().unwrap().clone();
    assert_eq!(spoken.len(), 2);
    assert!(spoken.iter().all(|s| s.starts_with("The time is ")));
}

#[tokio::test(start_paused = true)]
async fn duration_change_restarts_and_persists() {
    let policy = NotificationPolicy::default();
    let h = Harness::new(at(9, 0, 0), 45 * 60_000, policy);
    h.spawn_tasks();

    let snapshot = h.state.change_duration(0).unwrap();
    assert_eq!(snapshot.status(), TimerStatus::Running);
    assert_eq!(snapshot.session.total_duration_ms(), 3_600_000);
    assert_eq!(
        beepbeep::services::settings_store::load_duration_ms(h.settings.as_ref()),
        Some(3_600_000)
    );
    // UI chime only
    assert_eq!(h.beeps(), vec![1]);
    assert_eq!(h.speaker.cancels.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn backward_clock_step_does_not_repeat_a_boundary() {
    let policy = NotificationPolicy {
        interval_minutes: IntervalMinutes::new(5).unwrap(),
        ..quiet_policy()
    };
    let h = Harness::new(at(10, 2, 0), 20 * 60_000, policy);
    h.spawn_tasks();

    h.state.tap().unwrap();
    advance(Duration::from_secs(179)).await;
    // NTP-style correction shortly before 10:05
    h.clock.step(-500);
    advance(Duration::from_secs(2)).await;

    assert_eq!(h.beeps(), vec![2]);
    let fired = h.tone_times()[0];
    assert!((fired - (at(10, 5, 0) - 500)).abs() <= 1, "alert at {}", fired);

    // the next alert is the 10:10 boundary, once
    advance(Duration::from_secs(300)).await;
    assert_eq!(h.beeps(), vec![2, 2]);
}

#[tokio::test(start_paused = true)]
async fn forward_clock_jump_replans_the_completion() {
    let h = Harness::new(at(9, 0, 0), 20 * 60_000, quiet_policy());
    h.spawn_tasks();
    h.spawn_drift_watch();

    h.state.tap().unwrap();
    advance(Duration::from_secs(1)).await;
    // resumed from a 10 minute suspend the monotonic clock never saw
    h.clock.step(10 * 60_000);

    // the watchdog notices within one period and the completion moves to
    // 9:20 wall time, 600 s of monotonic time from the start
    advance(Duration::from_secs(16)).await;
    assert!(h.beeps().is_empty());
    advance(Duration::from_secs(600 - 17 + 1)).await;
    assert_eq!(h.beeps(), vec![6]);
    let fired = h.tone_times()[0];
    assert!((fired - at(9, 20, 0)).abs() <= 1, "completion at {}", fired);
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn clock_jump_past_the_end_completes_at_once() {
    let h = Harness::new(at(9, 0, 0), 20 * 60_000, quiet_policy());
    h.spawn_tasks();
    h.spawn_drift_watch();

    h.state.tap().unwrap();
    advance(Duration::from_secs(1)).await;
    h.clock.step(25 * 60_000);

    advance(Duration::from_secs(15)).await;
    assert_eq!(h.beeps(), vec![6]);
    assert_eq!(h.state.snapshot().unwrap().status(), TimerStatus::Idle);
}
