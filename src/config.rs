//! Static application configuration.

use crate::components::audio_manager::ControllerSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_BACKGROUND_TRACK: &str = "/assets/bgm.mp3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base: String,
    pub background_tracks: Vec<String>,
    pub default_background_volume: f64,
    pub prefetch_threshold_secs: f64,
    pub story_gap_ms: u64,
    pub media_ready_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            background_tracks: vec![DEFAULT_BACKGROUND_TRACK.to_string()],
            default_background_volume: 0.15,
            prefetch_threshold_secs: 20.0,
            story_gap_ms: 2000,
            media_ready_timeout_ms: 15_000,
        }
    }
}

impl AppConfig {
    /// Defaults, with the service base optionally baked in at build time.
    pub fn from_build_env() -> Self {
        Self::with_api_base(option_env!("STORYLOOP_API_BASE"))
    }

    fn with_api_base(api_base: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(base) = api_base.map(str::trim).filter(|base| !base.is_empty()) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        config
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            prefetch_threshold_secs: self.prefetch_threshold_secs,
            story_gap: Duration::from_millis(self.story_gap_ms),
            media_ready_timeout: Duration::from_millis(self.media_ready_timeout_ms),
            background_tracks: self.background_tracks.clone(),
        }
    }
}
