//! Listener preferences that survive a reload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

#[cfg(target_arch = "wasm32")]
const PREFERENCES_KEY: &str = "storyloop.preferences";
#[cfg(not(target_arch = "wasm32"))]
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[cfg(target_arch = "wasm32")]
    #[error("local storage: {0}")]
    Storage(#[from] gloo_storage::errors::StorageError),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("no data directory available")]
    NoDataDir,
}

/// Background audio settings chosen by the listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_background_volume")]
    pub background_volume: f64,
    #[serde(default)]
    pub background_muted: bool,
}

fn default_background_volume() -> f64 {
    0.15
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            background_volume: default_background_volume(),
            background_muted: false,
        }
    }
}

impl Preferences {
    /// Repairs values a hand-edited or stale record may carry.
    pub fn normalized(mut self) -> Self {
        if !self.background_volume.is_finite() {
            self.background_volume = default_background_volume();
        }
        self.background_volume = self.background_volume.clamp(0.0, 1.0);
        self
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn load_preferences() -> Result<Preferences, PrefsError> {
    match LocalStorage::get::<Preferences>(PREFERENCES_KEY) {
        Ok(prefs) => Ok(prefs.normalized()),
        Err(_) => Ok(Preferences::default()),
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn save_preferences(prefs: Preferences) -> Result<(), PrefsError> {
    LocalStorage::set(PREFERENCES_KEY, prefs)?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_preferences() -> Result<Preferences, PrefsError> {
    load_preferences_from(&preferences_path()?)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn save_preferences(prefs: Preferences) -> Result<(), PrefsError> {
    save_preferences_to(&preferences_path()?, &prefs)
}

#[cfg(not(target_arch = "wasm32"))]
fn preferences_path() -> Result<PathBuf, PrefsError> {
    let dir = dirs::data_dir().ok_or(PrefsError::NoDataDir)?;
    Ok(dir.join("storyloop").join(PREFERENCES_FILE))
}

/// Missing or unreadable records fall back to defaults.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_preferences_from(path: &Path) -> Result<Preferences, PrefsError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Preferences::default())
        }
        Err(err) => return Err(err.into()),
    };
    match serde_json::from_str::<Preferences>(&raw) {
        Ok(prefs) => Ok(prefs.normalized()),
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "ignoring corrupt preferences");
            Ok(Preferences::default())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<(), PrefsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(prefs)?)?;
    Ok(())
}
