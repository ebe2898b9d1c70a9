//! Beepbeep - A drift-free interval timer daemon
//!
//! This is the main entry point for the beepbeep application.

use std::{sync::Arc, time::Duration};

use tokio::net::TcpListener;
use tracing::{info, warn};

use beepbeep::{
    api::create_router,
    config::Config,
    services::{
        settings_store, BellTone, EspeakSpeaker, InhibitorLock, JsonFileStore, MemoryStore,
        Notifier, SettingsStore, SilentAudioLoop, WakeLockManager,
    },
    state::{AppState, Collaborators, DisplayFrame, TimerMachine, WatchDisplay},
    tasks::{audio_scheduler_task, drift_watch_task, visual_update_task, wake_lock_task},
    utils::{shutdown_signal, Clock, SystemClock},
};

/// How long shutdown waits for the wake lock to be released
const RELEASE_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("beepbeep={},tower_http=info", config.log_level()))
        .init();

    info!("Starting beepbeep server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}", config.host, config.port);

    let settings_path = config.settings_path();
    let settings: Arc<dyn SettingsStore> = match JsonFileStore::open(&settings_path) {
        Ok(store) => {
            info!("Settings file: {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                "Cannot use settings file {}: {}; settings will not persist",
                settings_path.display(),
                e
            );
            Arc::new(MemoryStore::default())
        }
    };

    let policy = settings_store::load_policy(settings.as_ref());
    let duration_ms = config
        .initial_duration_override()
        .or_else(|| settings_store::load_duration_ms(settings.as_ref()))
        .unwrap_or(beepbeep::state::session::DEFAULT_DURATION_MS);
    info!(
        "Session: {} min, interval {} min ({:?}), auto-restart {}",
        duration_ms / 60_000,
        policy.interval_minutes.minutes(),
        policy.interval_mode,
        policy.auto_restart
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let speaker = Arc::new(EspeakSpeaker::detect(&config.speech_program).await);
    let notifier = Notifier::new(Arc::new(BellTone), speaker, Arc::clone(&clock));
    let display = Arc::new(WatchDisplay::new(DisplayFrame::from_remaining_ms(duration_ms)));

    // Create application state
    let state = Arc::new(AppState::new(
        TimerMachine::new(duration_ms, policy),
        Collaborators {
            clock,
            notifier,
            display,
            settings,
        },
        config.port,
        config.host.clone(),
    ));

    // Start the background tasks
    tokio::spawn(audio_scheduler_task(Arc::clone(&state)));
    tokio::spawn(visual_update_task(Arc::clone(&state)));
    tokio::spawn(drift_watch_task(Arc::clone(&state)));

    let wake_lock = if config.no_wake_lock {
        info!("Wake lock disabled");
        None
    } else {
        let clip = std::env::temp_dir().join("beepbeep-silence.wav");
        let manager = WakeLockManager::new(
            InhibitorLock::new(&config.inhibit_program),
            SilentAudioLoop::new(&config.audio_player, &clip),
        );
        Some(tokio::spawn(wake_lock_task(Arc::clone(&state), manager)))
    };

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /tap        - Start, pause or resume");
    info!("  POST /duration   - Set the session length and start");
    info!("  POST /dial       - Dial drag feedback");
    info!("  POST /visibility - Report display visibility");
    info!("  GET  /display    - Latest rendered frame");
    info!("  GET  /status     - Check current status");
    info!("  GET  /settings   - Notification settings");
    info!("  PUT  /settings   - Update notification settings");
    info!("  POST /preview    - Preview an interval alert");
    info!("  GET  /health     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.begin_shutdown();
    if let Some(handle) = wake_lock {
        if tokio::time::timeout(RELEASE_TIMEOUT, handle).await.is_err() {
            warn!("Wake lock was not released within {:?}", RELEASE_TIMEOUT);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
