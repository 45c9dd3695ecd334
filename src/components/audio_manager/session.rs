//! Playback session state machine.
//!
//! Pure state with no I/O. The controller drives it around its awaits, so
//! every method here completes synchronously and a transition can never be
//! interleaved with another event.

use crate::api::{FetchError, Story};

/// Coarse lifecycle of the narration channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Playing,
    Transitioning,
    Stopped,
}

/// What the controller must do once the narration finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEnd {
    /// Looping is off; this cycle is over.
    Finished,
    /// The prefetched story was promoted and should play after the gap.
    Promote { story: Story, generation: u64 },
    /// Nothing was prefetched; fetch a story the slow way.
    Refetch,
}

/// Read-only view published to the UI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub phase: PlaybackPhase,
    pub story_text: Option<String>,
    pub looping: bool,
    pub muted: bool,
    pub volume: f64,
    pub message: Option<String>,
    pub has_pending: bool,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase == PlaybackPhase::Loading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    current: Option<Story>,
    pending: Option<Story>,
    looping: bool,
    prefetch_in_flight: bool,
    muted: bool,
    volume: f64,
    phase: PlaybackPhase,
    message: Option<String>,
    // Bumped on every start and stop; responses carrying an older value are stale.
    generation: u64,
}

impl PlaybackSession {
    pub fn new(volume: f64, muted: bool) -> Self {
        Self {
            current: None,
            pending: None,
            looping: false,
            prefetch_in_flight: false,
            muted,
            volume: clamp_volume(volume).unwrap_or(0.0),
            phase: PlaybackPhase::Idle,
            message: None,
            generation: 0,
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&Story> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&Story> {
        self.pending.as_ref()
    }

    #[cfg(test)]
    pub fn looping(&self) -> bool {
        self.looping
    }

    #[cfg(test)]
    pub fn prefetch_in_flight(&self) -> bool {
        self.prefetch_in_flight
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[cfg(test)]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current_run(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Enters `Loading` for a fresh story and returns the run ticket.
    ///
    /// Used both by an explicit start and by the no-prefetch fallback at
    /// narration end. Any prefetch still in flight belongs to the old run.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.looping = true;
        self.phase = PlaybackPhase::Loading;
        self.current = None;
        self.pending = None;
        self.prefetch_in_flight = false;
        self.message = None;
        self.generation
    }

    /// Applies a start fetch result. Returns the story to play, if any.
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: Result<Story, FetchError>,
    ) -> Option<Story> {
        if !self.is_current_run(generation) {
            return None;
        }
        match result {
            Ok(story) => {
                self.current = Some(story.clone());
                self.phase = PlaybackPhase::Transitioning;
                Some(story)
            }
            Err(err) => {
                // Looping stays on; the listener decides whether to retry.
                self.message = Some(err.user_message().to_string());
                self.phase = PlaybackPhase::Idle;
                None
            }
        }
    }

    /// Level-triggered prefetch check for a narration position update.
    pub fn prefetch_due(&self, remaining_secs: f64, threshold_secs: f64) -> bool {
        remaining_secs.is_finite() && remaining_secs < threshold_secs && self.can_prefetch()
    }

    fn can_prefetch(&self) -> bool {
        self.looping && self.current.is_some() && !self.prefetch_in_flight && self.pending.is_none()
    }

    /// Raises the in-flight guard. `None` when a prefetch is not allowed.
    pub fn claim_prefetch(&mut self) -> Option<u64> {
        if !self.can_prefetch() {
            return None;
        }
        self.prefetch_in_flight = true;
        Some(self.generation)
    }

    /// Stores a prefetched story, or drops it if the run it belongs to ended.
    /// Returns whether the story was kept.
    pub fn complete_prefetch(&mut self, generation: u64, result: Result<Story, FetchError>) -> bool {
        if !self.is_current_run(generation) {
            return false;
        }
        self.prefetch_in_flight = false;
        match result {
            Ok(story) if self.looping && self.current.is_some() => {
                self.pending = Some(story);
                true
            }
            _ => false,
        }
    }

    pub fn on_narration_end(&mut self) -> NarrationEnd {
        if !self.looping {
            if self.phase == PlaybackPhase::Playing {
                self.phase = PlaybackPhase::Stopped;
            }
            return NarrationEnd::Finished;
        }
        match self.pending.take() {
            Some(story) => {
                self.current = Some(story.clone());
                self.prefetch_in_flight = false;
                self.phase = PlaybackPhase::Transitioning;
                NarrationEnd::Promote {
                    story,
                    generation: self.generation,
                }
            }
            None => NarrationEnd::Refetch,
        }
    }

    pub fn mark_playing(&mut self) {
        self.phase = PlaybackPhase::Playing;
    }

    /// Records a media failure for the current story.
    pub fn mark_media_failed(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.phase = PlaybackPhase::Idle;
    }

    /// Ends the loop. The narration already playing is left alone.
    pub fn stop(&mut self) {
        self.generation += 1;
        self.looping = false;
        self.pending = None;
        self.prefetch_in_flight = false;
        self.phase = PlaybackPhase::Stopped;
    }

    /// Returns the applied value, or `None` when the input was not a number.
    pub fn set_volume(&mut self, volume: f64) -> Option<f64> {
        let volume = clamp_volume(volume)?;
        self.volume = volume;
        Some(volume)
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            story_text: self.current.as_ref().map(|story| story.text.clone()),
            looping: self.looping,
            muted: self.muted,
            volume: self.volume,
            message: self.message.clone(),
            has_pending: self.pending.is_some(),
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new(0.15, false)
    }
}

fn clamp_volume(volume: f64) -> Option<f64> {
    volume.is_finite().then(|| volume.clamp(0.0, 1.0))
}
