//! Audio Manager - drives narration and background playback outside of the
//! component render cycle, so re-renders never restart audio.

mod channel;
mod controller;
mod session;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(target_arch = "wasm32")]
mod web_channel;

#[cfg(not(target_arch = "wasm32"))]
pub use channel::SilentChannel;
pub use controller::{ControllerSettings, PlaybackController};
pub use session::SessionSnapshot;
#[cfg(target_arch = "wasm32")]
pub use web_channel::{bind_narration_events, WebAudioChannel};

use crate::api::StoryClient;
use crate::config::AppConfig;
use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
pub type PlatformChannel = WebAudioChannel;
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformChannel = SilentChannel;

pub type AppController = PlaybackController<StoryClient, PlatformChannel>;

/// Narration clock mirrored into signals for the progress readout.
#[derive(Clone, Copy)]
pub struct AudioState {
    pub current_time: Signal<f64>,
    pub duration: Signal<f64>,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            current_time: Signal::new(0.0),
            duration: Signal::new(0.0),
        }
    }
}

/// Drops progress updates that moved less than `min_step` seconds since the
/// last one emitted. A jump backwards (a new story) always passes.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Clone, Copy)]
pub struct ProgressThrottle {
    min_step: f64,
    last_emit: f64,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl ProgressThrottle {
    pub fn new(min_step: f64) -> Self {
        Self {
            min_step,
            last_emit: f64::NEG_INFINITY,
        }
    }

    pub fn should_emit(&mut self, time: f64) -> bool {
        if (time - self.last_emit).abs() >= self.min_step {
            self.last_emit = time;
            true
        } else {
            false
        }
    }
}

/// Build the controller for the current platform.
///
/// Returns `None` when the page has no document to host audio elements.
#[cfg(target_arch = "wasm32")]
pub fn create_controller(config: &AppConfig) -> Option<AppController> {
    let narration = WebAudioChannel::narration()?;
    let background = WebAudioChannel::background()?;
    Some(PlaybackController::new(
        StoryClient::new(config.api_base.clone()),
        narration,
        background,
        config.controller_settings(),
        config.default_background_volume,
        false,
    ))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn create_controller(config: &AppConfig) -> Option<AppController> {
    Some(PlaybackController::new(
        StoryClient::new(config.api_base.clone()),
        SilentChannel::new("narration"),
        SilentChannel::new("background"),
        config.controller_settings(),
        config.default_background_volume,
        false,
    ))
}
