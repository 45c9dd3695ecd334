//! In-memory doubles for controller tests.

use super::channel::{AudioChannel, ChannelError};
use crate::api::{FetchError, Story, StoryFetcher};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCall {
    Load(String),
    Play,
    SetVolume(f64),
    SetMuted(bool),
    Rewind,
}

struct ChannelState {
    calls: RefCell<Vec<ChannelCall>>,
    paused: Cell<bool>,
    position: Cell<f64>,
    duration: Cell<f64>,
    stall: Cell<bool>,
    fail_load: Cell<bool>,
    fail_play: Cell<bool>,
    open_loads: Cell<usize>,
}

// Counts a `load` as open until its future completes or is dropped.
struct OpenLoad(Rc<ChannelState>);

impl OpenLoad {
    fn begin(state: &Rc<ChannelState>) -> Self {
        state.open_loads.set(state.open_loads.get() + 1);
        Self(Rc::clone(state))
    }
}

impl Drop for OpenLoad {
    fn drop(&mut self) {
        self.0.open_loads.set(self.0.open_loads.get() - 1);
    }
}

/// Records every call; clones share state so tests can inspect the channel
/// after handing it to the controller.
#[derive(Clone)]
pub struct FakeChannel {
    state: Rc<ChannelState>,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self {
            state: Rc::new(ChannelState {
                calls: RefCell::new(Vec::new()),
                paused: Cell::new(true),
                position: Cell::new(0.0),
                duration: Cell::new(f64::NAN),
                stall: Cell::new(false),
                fail_load: Cell::new(false),
                fail_play: Cell::new(false),
                open_loads: Cell::new(0),
            }),
        }
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.state.calls.borrow().clone()
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.paused.set(paused);
    }

    pub fn set_position(&self, position: f64) {
        self.state.position.set(position);
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.duration.set(duration);
    }

    /// Every later `load` never becomes ready.
    pub fn stall_loads(&self) {
        self.state.stall.set(true);
    }

    /// Loads still waiting on readiness. Zero once every caller has moved on.
    pub fn open_loads(&self) -> usize {
        self.state.open_loads.get()
    }

    /// Every later `load` reports a media error.
    pub fn fail_loads(&self) {
        self.state.fail_load.set(true);
    }

    /// Every later `play` is refused, as an autoplay policy would.
    pub fn fail_play(&self) {
        self.state.fail_play.set(true);
    }

    fn record(&self, call: ChannelCall) {
        self.state.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl AudioChannel for FakeChannel {
    async fn load(&self, src: &str) -> Result<(), ChannelError> {
        let _open = OpenLoad::begin(&self.state);
        if self.state.stall.get() {
            std::future::pending::<()>().await;
        }
        self.record(ChannelCall::Load(src.to_string()));
        if self.state.fail_load.get() {
            return Err(ChannelError::Load {
                src: src.to_string(),
                reason: "network error".to_string(),
            });
        }
        self.state.position.set(0.0);
        Ok(())
    }

    async fn play(&self) -> Result<(), ChannelError> {
        if self.state.fail_play.get() {
            return Err(ChannelError::Play("NotAllowedError".to_string()));
        }
        self.record(ChannelCall::Play);
        self.state.paused.set(false);
        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.state.paused.get()
    }

    fn current_time(&self) -> f64 {
        self.state.position.get()
    }

    fn duration(&self) -> f64 {
        self.state.duration.get()
    }

    fn set_volume(&self, volume: f64) {
        self.record(ChannelCall::SetVolume(volume));
    }

    fn set_muted(&self, muted: bool) {
        self.record(ChannelCall::SetMuted(muted));
    }

    fn rewind(&self) {
        self.record(ChannelCall::Rewind);
        self.state.position.set(0.0);
    }
}

struct FetcherState {
    scripted: RefCell<VecDeque<Result<Story, FetchError>>>,
    calls: Cell<usize>,
    held: Cell<bool>,
    gate: Notify,
}

/// Serves `story N` for the Nth call unless a result was pushed, and can
/// hold requests open until released.
#[derive(Clone)]
pub struct ScriptedFetcher {
    state: Rc<FetcherState>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            state: Rc::new(FetcherState {
                scripted: RefCell::new(VecDeque::new()),
                calls: Cell::new(0),
                held: Cell::new(false),
                gate: Notify::new(),
            }),
        }
    }

    pub fn push(&self, result: Result<Story, FetchError>) {
        self.state.scripted.borrow_mut().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.get()
    }

    pub fn hold(&self) {
        self.state.held.set(true);
    }

    pub fn release(&self) {
        self.state.held.set(false);
        self.state.gate.notify_waiters();
    }
}

#[async_trait(?Send)]
impl StoryFetcher for ScriptedFetcher {
    async fn fetch_story(&self) -> Result<Story, FetchError> {
        let n = self.state.calls.get() + 1;
        self.state.calls.set(n);

        if self.state.held.get() {
            self.state.gate.notified().await;
        }

        let scripted = self.state.scripted.borrow_mut().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Story::new(
                format!("story {n}"),
                format!("http://test/{n}.mp3?t={n}"),
            ))
        })
    }
}
