//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

use crate::services::settings_store;

/// Longest session the dial can express, in minutes
pub const MAX_DURATION_MINUTES: u32 = 60;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "beepbeep")]
#[command(about = "A drift-free interval timer daemon with wall-clock aligned alerts")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial session length in minutes (1-60), not persisted
    #[arg(short, long)]
    pub duration: Option<u32>,

    /// Settings file location
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Speech synthesizer used for spoken interval alerts
    #[arg(long, default_value = "espeak-ng")]
    pub speech_program: String,

    /// Player used by the silent-audio keep-awake fallback
    #[arg(long, default_value = "aplay")]
    pub audio_player: String,

    /// Program used to inhibit idle sleep while the timer runs
    #[arg(long, default_value = "systemd-inhibit")]
    pub inhibit_program: String,

    /// Never try to keep the machine awake
    #[arg(long)]
    pub no_wake_lock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Session length requested on the command line, in milliseconds.
    /// Out-of-range values are ignored.
    pub fn initial_duration_override(&self) -> Option<i64> {
        match self.duration {
            Some(minutes) if (1..=MAX_DURATION_MINUTES).contains(&minutes) => {
                Some(i64::from(minutes) * 60_000)
            }
            Some(minutes) => {
                warn!(
                    "Ignoring --duration {}: must be between 1 and {} minutes",
                    minutes, MAX_DURATION_MINUTES
                );
                None
            }
            None => None,
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(settings_store::default_settings_path)
    }
}
