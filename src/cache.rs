//! Client cache service.
//!
//! Holds the last-known-good snapshot of every page under its own key, plus
//! the colour theme. One [`ClientCache`] is built at startup and cloned into
//! each view model; nothing reads storage behind its back.
//!
//! Each key has exactly one writer (the view model that owns it), so the
//! stores need no cross-key coordination.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// ---

/// Storage key for one cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Theme,
    DashboardStats,
    DashboardWeather,
    DashboardAlerts,
    AnalyticsData,
    SensorHistory,
    AlertsLog,
    SystemStatus,
    IrrigationConfig,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Theme => "theme",
            CacheKey::DashboardStats => "dashboard_stats",
            CacheKey::DashboardWeather => "dashboard_weather",
            CacheKey::DashboardAlerts => "dashboard_alerts",
            CacheKey::AnalyticsData => "analytics_data",
            CacheKey::SensorHistory => "sensor_history",
            CacheKey::AlertsLog => "alerts_log",
            CacheKey::SystemStatus => "system_status",
            CacheKey::IrrigationConfig => "irrigation_config",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Raw string storage behind the cache.
pub trait CacheStore: Send + Sync {
    /// Read the raw entry for `key`, `None` if it was never written.
    fn read(&self, key: CacheKey) -> Result<Option<String>, CacheError>;

    /// Replace the raw entry for `key`.
    fn write(&self, key: CacheKey, value: &str) -> Result<(), CacheError>;
}

/// One JSON file per key inside a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a cache directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        tracing::debug!("Cache directory: {}", dir.display());
        Ok(Self { dir })
    }

    fn path_for(&self, key: CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl CacheStore for FileStore {
    fn read(&self, key: CacheKey) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: CacheKey, value: &str) -> Result<(), CacheError> {
        // Write-then-rename so a reader never sees a half-written snapshot
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process store, used by tests and when no cache directory is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, String>>,
}

impl CacheStore for MemoryStore {
    fn read(&self, key: CacheKey) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(&key).cloned())
    }

    fn write(&self, key: CacheKey, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key, value.to_string());
        Ok(())
    }
}

/// Typed get/set facade over a [`CacheStore`].
#[derive(Clone)]
pub struct ClientCache {
    store: Arc<dyn CacheStore>,
}

impl fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCache").finish_non_exhaustive()
    }
}

impl ClientCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    pub fn on_disk(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self::new(Arc::new(FileStore::open(dir)?)))
    }

    /// Load the snapshot stored under `key`.
    ///
    /// Unreadable or corrupt entries are logged and reported as absent; a bad
    /// cache file must never stop a page from mounting.
    pub fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        // ---
        let raw = match self.store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read cache entry '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Overwrite the snapshot stored under `key`.
    pub fn set<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.write(key, &raw)
    }

    pub fn theme(&self) -> Theme {
        self.get(CacheKey::Theme).unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), CacheError> {
        self.set(CacheKey::Theme, &theme)
    }
}
