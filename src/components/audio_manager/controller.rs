//! Continuous playback with next-story prefetch.
//!
//! The controller owns the session and both audio channels. Event handlers
//! call into it from the UI executor; every future it returns is `!Send` and
//! must stay on that thread.

use super::channel::{AudioChannel, ChannelError};
use super::session::{NarrationEnd, PlaybackSession, SessionSnapshot};
use crate::api::{Story, StoryFetcher};
use crate::utils::{pick_background_track, sleep};
use futures_util::future::{select, Either};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Prefetch once less than this much narration remains.
    pub prefetch_threshold_secs: f64,
    /// Pause between a finished story and the promoted one.
    pub story_gap: Duration,
    /// Upper bound on waiting for a source to become playable.
    pub media_ready_timeout: Duration,
    pub background_tracks: Vec<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            prefetch_threshold_secs: 20.0,
            story_gap: Duration::from_millis(2000),
            media_ready_timeout: Duration::from_secs(15),
            background_tracks: vec!["/assets/bgm.mp3".to_string()],
        }
    }
}

type Observer = Box<dyn Fn(SessionSnapshot)>;

struct ControllerInner<F, C> {
    session: RefCell<PlaybackSession>,
    fetcher: F,
    narration: C,
    background: C,
    settings: ControllerSettings,
    observer: RefCell<Option<Observer>>,
}

pub struct PlaybackController<F, C> {
    inner: Rc<ControllerInner<F, C>>,
}

impl<F, C> Clone for PlaybackController<F, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

// Identity, not state: two handles are equal when they drive the same session.
impl<F, C> PartialEq for PlaybackController<F, C> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<F, C> PlaybackController<F, C>
where
    F: StoryFetcher,
    C: AudioChannel,
{
    pub fn new(
        fetcher: F,
        narration: C,
        background: C,
        settings: ControllerSettings,
        volume: f64,
        muted: bool,
    ) -> Self {
        let session = PlaybackSession::new(volume, muted);
        background.set_volume(session.volume());
        background.set_muted(session.muted());

        Self {
            inner: Rc::new(ControllerInner {
                session: RefCell::new(session),
                fetcher,
                narration,
                background,
                settings,
                observer: RefCell::new(None),
            }),
        }
    }

    /// Registers the callback that receives a snapshot after every change.
    pub fn set_observer(&self, observer: impl Fn(SessionSnapshot) + 'static) {
        *self.inner.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.borrow().snapshot()
    }

    #[cfg(test)]
    pub fn session(&self) -> PlaybackSession {
        self.inner.session.borrow().clone()
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    pub fn narration(&self) -> &C {
        &self.inner.narration
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        if let Some(observer) = self.inner.observer.borrow().as_ref() {
            observer(snapshot);
        }
    }

    /// Fetches a story and plays it, starting the background loop if needed.
    pub async fn start(&self) {
        let generation = self.inner.session.borrow_mut().begin_fetch();
        info!(generation, "fetching story");
        self.notify();

        let result = self.inner.fetcher.fetch_story().await;
        if let Err(err) = &result {
            warn!(%err, duplicate = err.is_duplicate(), "story fetch failed");
        }

        let story = {
            let mut session = self.inner.session.borrow_mut();
            if !session.is_current_run(generation) {
                debug!(generation, "discarding story for an ended run");
                return;
            }
            session.complete_fetch(generation, result)
        };
        self.notify();

        if let Some(story) = story {
            self.play_story(&story, generation).await;
        }
    }

    /// Ends the loop. Whatever is currently audible keeps playing.
    pub fn stop(&self) {
        self.inner.session.borrow_mut().stop();
        info!("story loop stopped");
        self.notify();
    }

    /// Narration position changed; prefetch when the end is near.
    pub async fn on_time_update(&self) {
        let remaining = self.inner.narration.remaining();
        let due = self
            .inner
            .session
            .borrow()
            .prefetch_due(remaining, self.inner.settings.prefetch_threshold_secs);
        if due {
            debug!(remaining, "narration ending soon");
            self.prefetch_next().await;
        }
    }

    /// Fetches the next story into `pending` unless one is already there or on its way.
    ///
    /// The guard is claimed before the first await, so concurrent callers
    /// polled on the same thread can never issue a second request.
    pub async fn prefetch_next(&self) {
        let Some(generation) = self.inner.session.borrow_mut().claim_prefetch() else {
            return;
        };

        debug!(generation, "prefetching next story");
        let result = self.inner.fetcher.fetch_story().await;
        if let Err(err) = &result {
            warn!(%err, "prefetch failed");
        }

        let kept = self
            .inner
            .session
            .borrow_mut()
            .complete_prefetch(generation, result);
        if kept {
            info!("next story ready");
            self.notify();
        } else {
            debug!(generation, "prefetch result dropped");
        }
    }

    pub async fn on_narration_end(&self) {
        let action = self.inner.session.borrow_mut().on_narration_end();
        match action {
            NarrationEnd::Finished => {
                debug!("narration finished with looping off");
                self.notify();
            }
            NarrationEnd::Promote { story, generation } => {
                info!("promoting prefetched story");
                self.notify();

                sleep(self.inner.settings.story_gap).await;
                if !self.inner.session.borrow().is_current_run(generation) {
                    debug!("loop stopped during story gap");
                    return;
                }
                self.play_story(&story, generation).await;
            }
            NarrationEnd::Refetch => {
                info!("no prefetched story, fetching now");
                self.start().await;
            }
        }
    }

    pub fn set_volume(&self, volume: f64) {
        let applied = self.inner.session.borrow_mut().set_volume(volume);
        if let Some(volume) = applied {
            self.inner.background.set_volume(volume);
            self.notify();
        }
    }

    pub fn set_muted(&self, muted: bool) {
        self.inner.session.borrow_mut().set_muted(muted);
        self.inner.background.set_muted(muted);
        self.notify();
    }

    pub fn toggle_mute(&self) -> bool {
        let muted = !self.inner.session.borrow().muted();
        self.set_muted(muted);
        muted
    }

    async fn play_story(&self, story: &Story, generation: u64) {
        let loaded = self
            .load_when_ready(&self.inner.narration, &story.audio_url)
            .await;

        if !self.inner.session.borrow().is_current_run(generation) {
            debug!("loop stopped while narration was loading");
            return;
        }

        let started = match loaded {
            Ok(()) => self.inner.narration.play().await,
            Err(err) => Err(err),
        };
        if let Err(err) = started {
            warn!(%err, audio_url = %story.audio_url, "narration playback failed");
            if self.inner.session.borrow().is_current_run(generation) {
                self.inner
                    .session
                    .borrow_mut()
                    .mark_media_failed(err.user_message());
                self.notify();
            }
            return;
        }

        self.ensure_background().await;
        if !self.inner.session.borrow().is_current_run(generation) {
            debug!("loop stopped while narration was starting");
            return;
        }
        self.inner.session.borrow_mut().mark_playing();
        self.notify();
    }

    /// Starts the background loop from the top if it is not already audible.
    async fn ensure_background(&self) {
        let background = &self.inner.background;
        if !background.is_paused() {
            return;
        }
        let Some(track) = pick_background_track(&self.inner.settings.background_tracks) else {
            return;
        };

        if let Err(err) = self.load_when_ready(background, track).await {
            warn!(%err, "background track unavailable");
            return;
        }

        let (volume, muted) = {
            let session = self.inner.session.borrow();
            (session.volume(), session.muted())
        };
        background.set_volume(volume);
        background.set_muted(muted);
        background.rewind();
        if let Err(err) = background.play().await {
            warn!(%err, "background track did not start");
        }
    }

    async fn load_when_ready(&self, channel: &C, src: &str) -> Result<(), ChannelError> {
        let load = channel.load(src);
        let timeout = Box::pin(sleep(self.inner.settings.media_ready_timeout));
        match select(load, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(_) => Err(ChannelError::Timeout {
                src: src.to_string(),
            }),
        }
    }
}
