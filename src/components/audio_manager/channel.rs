use async_trait::async_trait;
use thiserror::Error;

// Only the browser channel raises load and play errors outside tests.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to load {src}: {reason}")]
    Load { src: String, reason: String },
    #[error("timed out waiting for {src} to become playable")]
    Timeout { src: String },
    #[error("playback rejected: {0}")]
    Play(String),
}

impl ChannelError {
    pub fn user_message(&self) -> &'static str {
        "Story audio could not be loaded."
    }
}

/// A single audio output the controller can drive.
///
/// `load` resolves once the media is ready to play, replacing any fixed
/// settle delay. `play` resolves once playback has actually begun and fails
/// if the host refuses it. All other calls are plain property reads and writes.
#[async_trait(?Send)]
pub trait AudioChannel {
    async fn load(&self, src: &str) -> Result<(), ChannelError>;
    async fn play(&self) -> Result<(), ChannelError>;
    fn is_paused(&self) -> bool;
    fn current_time(&self) -> f64;
    /// Track length in seconds. Not finite until metadata has loaded.
    fn duration(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn set_muted(&self, muted: bool);
    fn rewind(&self);

    fn remaining(&self) -> f64 {
        self.duration() - self.current_time()
    }
}

/// Output used where no browser audio element exists (native builds).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SilentChannel {
    label: &'static str,
}

#[cfg(not(target_arch = "wasm32"))]
impl SilentChannel {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl AudioChannel for SilentChannel {
    async fn load(&self, src: &str) -> Result<(), ChannelError> {
        tracing::debug!(channel = self.label, %src, "silent channel load");
        Ok(())
    }

    async fn play(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    fn is_paused(&self) -> bool {
        true
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> f64 {
        f64::NAN
    }

    fn set_volume(&self, _volume: f64) {}

    fn set_muted(&self, _muted: bool) {}

    fn rewind(&self) {}
}
