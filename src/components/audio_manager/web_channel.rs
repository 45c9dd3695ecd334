// Browser audio elements and their event wiring.
use super::channel::{AudioChannel, ChannelError};
use super::controller::PlaybackController;
use super::ProgressThrottle;
use crate::api::StoryFetcher;
use async_trait::async_trait;
use dioxus::core::{Runtime, RuntimeGuard};
use dioxus::prelude::spawn;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, AbortController, AddEventListenerOptions, HtmlAudioElement};

pub const NARRATION_ELEMENT_ID: &str = "storyloop-narration";
pub const BACKGROUND_ELEMENT_ID: &str = "storyloop-background";

/// Look up the audio element by id, creating it hidden on first use.
pub fn get_or_create_audio_element(id: &str) -> Option<HtmlAudioElement> {
    let document = window()?.document()?;

    if let Some(existing) = document.get_element_by_id(id) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio: HtmlAudioElement = document.create_element("audio").ok()?.dyn_into().ok()?;
    audio.set_id(id);
    audio.set_attribute("preload", "auto").ok()?;
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}

pub struct WebAudioChannel {
    element: HtmlAudioElement,
}

impl WebAudioChannel {
    pub fn narration() -> Option<Self> {
        let element = get_or_create_audio_element(NARRATION_ELEMENT_ID)?;
        element.set_loop(false);
        Some(Self { element })
    }

    pub fn background() -> Option<Self> {
        let element = get_or_create_audio_element(BACKGROUND_ELEMENT_ID)?;
        element.set_loop(true);
        Some(Self { element })
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

// Aborting on drop detaches both load listeners, whichever one fired.
struct ListenerScope(AbortController);

impl Drop for ListenerScope {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// Settles on the next `canplay` (resolve) or `error` (reject).
fn media_ready(element: &HtmlAudioElement, scope: &ListenerScope) -> js_sys::Promise {
    let target = element.clone();
    let signal = scope.0.signal();
    js_sys::Promise::new(&mut |resolve, reject| {
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        options.set_signal(&signal);
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            "canplay", &resolve, &options,
        );
        let _ = target.add_event_listener_with_callback_and_add_event_listener_options(
            "error", &reject, &options,
        );
    })
}

fn media_error_reason(element: &HtmlAudioElement, fallback: &JsValue) -> String {
    let code = element.error().map(|err| err.code()).unwrap_or(0);
    match code {
        1 => "aborted before the source loaded".to_string(),
        2 => "network error".to_string(),
        3 => "decode error".to_string(),
        4 => "source not supported".to_string(),
        _ => format!("{fallback:?}"),
    }
}

#[async_trait(?Send)]
impl AudioChannel for WebAudioChannel {
    async fn load(&self, src: &str) -> Result<(), ChannelError> {
        // Dropped on settle or when the caller gives up waiting.
        let scope = AbortController::new()
            .map(ListenerScope)
            .map_err(|err| ChannelError::Load {
                src: src.to_string(),
                reason: format!("{err:?}"),
            })?;
        let ready = media_ready(&self.element, &scope);
        self.element.set_src(src);
        self.element.load();
        JsFuture::from(ready)
            .await
            .map(|_| ())
            .map_err(|err| ChannelError::Load {
                src: src.to_string(),
                reason: media_error_reason(&self.element, &err),
            })
    }

    async fn play(&self) -> Result<(), ChannelError> {
        let promise = self
            .element
            .play()
            .map_err(|err| ChannelError::Play(format!("{err:?}")))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| ChannelError::Play(format!("{err:?}")))
    }

    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume.clamp(0.0, 1.0));
    }

    fn set_muted(&self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn rewind(&self) {
        self.element.set_current_time(0.0);
    }
}

/// Route narration `timeupdate` and `ended` events into the controller.
///
/// `on_progress` receives `(current_time, duration)` on every update.
pub fn bind_narration_events<F>(
    controller: PlaybackController<F, WebAudioChannel>,
    mut on_progress: impl FnMut(f64, f64) + 'static,
) where
    F: StoryFetcher + 'static,
{
    let element = controller.narration().element().clone();
    let runtime = Runtime::current();

    let time_controller = controller.clone();
    let time_runtime = runtime.clone();
    let mut throttle = ProgressThrottle::new(0.2);
    let time_closure = Closure::wrap(Box::new(move || {
        let _guard = RuntimeGuard::new(time_runtime.clone());
        let narration = time_controller.narration();
        let time = narration.current_time();
        // ~5 updates per second is enough for the readout
        if throttle.should_emit(time) {
            on_progress(time, narration.duration());
        }
        let controller = time_controller.clone();
        spawn(async move {
            controller.on_time_update().await;
        });
    }) as Box<dyn FnMut()>);
    element.set_ontimeupdate(Some(time_closure.as_ref().unchecked_ref()));
    time_closure.forget();

    let end_runtime = runtime.clone();
    let end_closure = Closure::wrap(Box::new(move || {
        let _guard = RuntimeGuard::new(end_runtime.clone());
        let controller = controller.clone();
        spawn(async move {
            controller.on_narration_end().await;
        });
    }) as Box<dyn FnMut()>);
    element.set_onended(Some(end_closure.as_ref().unchecked_ref()));
    end_closure.forget();
}
