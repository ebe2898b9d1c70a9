//! Settings persistence: a synchronous key-value store surviving restarts

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::SettingsError,
    state::{IntervalMinutes, IntervalMode, NotificationPolicy},
};

pub const KEY_AUTO_RESTART: &str = "timer-autoRestart";
pub const KEY_INTERVAL: &str = "timer-intervalBeep";
pub const KEY_INTERVAL_MODE: &str = "timer-intervalType";
pub const KEY_UI_CHIME: &str = "timer-uiChime";
pub const KEY_DURATION: &str = "timer-duration";

/// Key-value store with get-or-default semantics
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str, default: Value) -> Value;
    fn set(&self, key: &str, value: Value);

    /// Store several values as one update
    fn set_many(&self, entries: Vec<(&str, Value)>) {
        for (key, value) in entries {
            self.set(key, value);
        }
    }
}

/// Default location of the settings file
pub fn default_settings_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("beepbeep").join("settings.json")
}

/// Settings kept as one JSON object on disk, rewritten on every `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or malformed one is reported.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let values = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents)? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} setting(s) from {}", values.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &Map<String, Value>) -> Result<(), SettingsError> {
        let parent = self.path.parent().ok_or(SettingsError::NoParent)?;
        fs::create_dir_all(parent)?;
        let contents = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str, default: Value) -> Value {
        match self.values.lock() {
            Ok(values) => values.get(key).cloned().unwrap_or(default),
            Err(_) => default,
        }
    }

    fn set(&self, key: &str, value: Value) {
        let Ok(mut values) = self.values.lock() else {
            warn!("Settings lock poisoned, dropping {}", key);
            return;
        };
        values.insert(key.to_string(), value);
        if let Err(e) = self.save(&values) {
            warn!("Failed to persist settings to {}: {}", self.path.display(), e);
        }
    }

    fn set_many(&self, entries: Vec<(&str, Value)>) {
        let Ok(mut values) = self.values.lock() else {
            warn!("Settings lock poisoned, dropping {} value(s)", entries.len());
            return;
        };
        for (key, value) in entries {
            values.insert(key.to_string(), value);
        }
        if let Err(e) = self.save(&values) {
            warn!("Failed to persist settings to {}: {}", self.path.display(), e);
        }
    }
}

/// Process-local store, used when persistence is unavailable
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str, default: Value) -> Value {
        match self.values.lock() {
            Ok(values) => values.get(key).cloned().unwrap_or(default),
            Err(_) => default,
        }
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value);
        }
    }
}

fn get_typed<T>(store: &dyn SettingsStore, key: &str, default: T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let fallback = serde_json::to_value(&default).unwrap_or(Value::Null);
    let value = store.get(key, fallback);
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Ignoring stored {}: {}", key, e);
            default
        }
    }
}

fn set_typed<T: Serialize>(store: &dyn SettingsStore, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(value) => store.set(key, value),
        Err(e) => warn!("Failed to encode {}: {}", key, e),
    }
}

fn encode<T: Serialize>(key: &'static str, value: &T) -> Option<(&'static str, Value)> {
    match serde_json::to_value(value) {
        Ok(value) => Some((key, value)),
        Err(e) => {
            warn!("Failed to encode {}: {}", key, e);
            None
        }
    }
}

/// Load the notification policy, field by field, falling back to defaults
pub fn load_policy(store: &dyn SettingsStore) -> NotificationPolicy {
    let defaults = NotificationPolicy::default();
    NotificationPolicy {
        auto_restart: get_typed(store, KEY_AUTO_RESTART, defaults.auto_restart),
        interval_minutes: get_typed::<IntervalMinutes>(store, KEY_INTERVAL, defaults.interval_minutes),
        interval_mode: get_typed::<IntervalMode>(store, KEY_INTERVAL_MODE, defaults.interval_mode),
        ui_chime_enabled: get_typed(store, KEY_UI_CHIME, defaults.ui_chime_enabled),
    }
}

/// Persist every policy field in a single store update
pub fn save_policy(store: &dyn SettingsStore, policy: &NotificationPolicy) {
    let entries = [
        encode(KEY_AUTO_RESTART, &policy.auto_restart),
        encode(KEY_INTERVAL, &policy.interval_minutes),
        encode(KEY_INTERVAL_MODE, &policy.interval_mode),
        encode(KEY_UI_CHIME, &policy.ui_chime_enabled),
    ];
    store.set_many(entries.into_iter().flatten().collect());
}

/// Last chosen session length, if any was stored
pub fn load_duration_ms(store: &dyn SettingsStore) -> Option<i64> {
    let seconds: Option<i64> = get_typed(store, KEY_DURATION, None);
    seconds.filter(|s| *s > 0).map(|s| s * 1000)
}

pub fn save_duration_ms(store: &dyn SettingsStore, duration_ms: i64) {
    set_typed(store, KEY_DURATION, &(duration_ms / 1000));
}
