//! Sleep prevention with a primary inhibitor and a silent-audio fallback
//!
//! A sleeping device stalls every timer in the process, which looks exactly
//! like correct behaviour until someone comes back to the screen. While a
//! session runs we therefore hold an idle/sleep inhibitor, and when that is
//! unavailable or denied we keep a silent audio stream playing instead.
//! Neither failure is ever fatal.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::{
    process::{Child, Command},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::error::WakeLockError;

/// How long a freshly spawned inhibitor or player must survive to count as started
const STARTUP_PROBE: Duration = Duration::from_millis(200);

/// Which mechanism currently keeps the device awake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeLockMode {
    #[default]
    Released,
    Primary,
    Fallback,
}

/// Primary sleep prevention mechanism
pub trait ScreenLock: Send {
    fn acquire(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>>;
    fn release(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>>;
}

/// Best-effort mechanism used when the primary one fails
pub trait KeepAwakeFallback: Send {
    fn start(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>>;
    fn stop(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>>;

    /// Whether a started fallback is still keeping the device awake
    fn is_running(&self) -> bool;
}

/// Acquires the primary lock, falls back on any failure
pub struct WakeLockManager<P, F> {
    primary: P,
    fallback: F,
    mode: WakeLockMode,
}

impl<P: ScreenLock, F: KeepAwakeFallback> WakeLockManager<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            mode: WakeLockMode::Released,
        }
    }

    pub fn mode(&self) -> WakeLockMode {
        self.mode
    }

    /// Hold sleep prevention; a no-op when already held. A fallback that
    /// died since it was started counts as released and is tried again.
    pub async fn acquire(&mut self) -> WakeLockMode {
        if self.mode == WakeLockMode::Fallback && !self.fallback.is_running() {
            warn!("Silent audio fallback stopped on its own");
            if let Err(e) = self.fallback.stop().await {
                debug!("Cleaning up silent audio fallback failed: {}", e);
            }
            self.mode = WakeLockMode::Released;
        }
        if self.mode != WakeLockMode::Released {
            return self.mode;
        }

        self.mode = match self.primary.acquire().await {
            Ok(()) => {
                info!("Wake lock acquired");
                WakeLockMode::Primary
            }
            Err(e) => {
                warn!("Failed to acquire wake lock, falling back to silent audio: {}", e);
                match self.fallback.start().await {
                    Ok(()) => {
                        info!("Silent audio fallback started");
                        WakeLockMode::Fallback
                    }
                    Err(e) => {
                        warn!("Wake lock audio fallback failed: {}", e);
                        WakeLockMode::Released
                    }
                }
            }
        };
        self.mode
    }

    /// Drop whatever mechanism is held
    pub async fn release(&mut self) {
        let result = match self.mode {
            WakeLockMode::Released => return,
            WakeLockMode::Primary => self.primary.release().await,
            WakeLockMode::Fallback => self.fallback.stop().await,
        };
        if let Err(e) = result {
            warn!("Failed to release wake lock: {}", e);
        }
        debug!("Wake lock released ({:?})", self.mode);
        self.mode = WakeLockMode::Released;
    }
}

/// Holds a `systemd-inhibit` child process for as long as the lock is held
#[derive(Debug)]
pub struct InhibitorLock {
    program: String,
    child: Option<Child>,
}

impl InhibitorLock {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            child: None,
        }
    }

    async fn spawn(&mut self) -> Result<(), WakeLockError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args([
                "--what=idle:sleep",
                "--who=beepbeep",
                "--why=Interval timer running",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => WakeLockError::Unsupported(format!("{} not found", self.program)),
                ErrorKind::PermissionDenied => WakeLockError::Denied(e.to_string()),
                _ => WakeLockError::Io(e),
            })?;

        // An inhibitor that is refused exits straight away
        let probe = timeout(STARTUP_PROBE, child.wait()).await;
        match probe {
            Ok(Ok(status)) => Err(WakeLockError::Denied(format!(
                "{} exited with {}",
                self.program, status
            ))),
            Ok(Err(e)) => Err(WakeLockError::Io(e)),
            Err(_) => {
                self.child = Some(child);
                Ok(())
            }
        }
    }

    async fn kill(&mut self) -> Result<(), WakeLockError> {
        if let Some(mut child) = self.child.take() {
            child.kill().await?;
        }
        Ok(())
    }
}

impl ScreenLock for InhibitorLock {
    fn acquire(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>> {
        Box::pin(self.spawn())
    }

    fn release(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>> {
        Box::pin(self.kill())
    }
}

/// Sample rate of the generated silence
const SILENCE_SAMPLE_RATE: u32 = 8000;

/// Mono 8-bit PCM WAV containing `seconds` of silence
pub fn silent_wav(seconds: u32) -> Vec<u8> {
    let data_len = SILENCE_SAMPLE_RATE * seconds;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SILENCE_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&SILENCE_SAMPLE_RATE.to_le_bytes()); // byte rate
    wav.extend_from_slice(&1u16.to_le_bytes()); // block align
    wav.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    // unsigned 8-bit silence sits at the midpoint
    wav.resize(44 + data_len as usize, 0x80);
    wav
}

/// Loops a silent clip through an audio player until stopped
#[derive(Debug)]
pub struct SilentAudioLoop {
    player: String,
    clip: PathBuf,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SilentAudioLoop {
    pub fn new(player: &str, clip: &Path) -> Self {
        Self {
            player: player.to_string(),
            clip: clip.to_path_buf(),
            stop_tx: None,
            task: None,
        }
    }

    fn play_once(player: &str, clip: &Path) -> std::io::Result<Child> {
        Command::new(player)
            .arg("-q")
            .arg(clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }

    async fn begin(&mut self) -> Result<(), WakeLockError> {
        if self.task.is_some() {
            return Ok(());
        }

        tokio::fs::write(&self.clip, silent_wav(1)).await?;
        // first spawn happens here so a missing or broken player is reported
        // to the caller
        let mut first = Self::play_once(&self.player, &self.clip).map_err(|e| match e.kind() {
            ErrorKind::NotFound => WakeLockError::Unsupported(format!("{} not found", self.player)),
            _ => WakeLockError::Io(e),
        })?;
        let probe = timeout(STARTUP_PROBE, first.wait()).await;
        let first = match probe {
            Ok(Ok(status)) if !status.success() => {
                return Err(WakeLockError::Unsupported(format!(
                    "{} exited with {}",
                    self.player, status
                )));
            }
            Ok(Ok(_)) => Self::play_once(&self.player, &self.clip)?,
            Ok(Err(e)) => return Err(WakeLockError::Io(e)),
            Err(_) => first,
        };

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let player = self.player.clone();
        let clip = self.clip.clone();
        let task = tokio::spawn(async move {
            let mut child = first;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        let _ = child.kill().await;
                        break;
                    }
                    status = child.wait() => {
                        match status {
                            Ok(status) if status.success() => {}
                            Ok(status) => {
                                warn!("{} exited with {}, stopping silent audio", player, status);
                                break;
                            }
                            Err(e) => {
                                warn!("Failed to wait for {}: {}", player, e);
                                break;
                            }
                        }
                        child = match Self::play_once(&player, &clip) {
                            Ok(child) => child,
                            Err(e) => {
                                warn!("Failed to restart {}: {}", player, e);
                                break;
                            }
                        };
                    }
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        Ok(())
    }

    async fn end(&mut self) -> Result<(), WakeLockError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Silent audio task ended abnormally: {}", e);
            }
        }
        Ok(())
    }
}

impl KeepAwakeFallback for SilentAudioLoop {
    fn start(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>> {
        Box::pin(self.begin())
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), WakeLockError>> {
        Box::pin(self.end())
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}
