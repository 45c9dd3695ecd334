use crate::components::audio_manager::{AppController, SessionSnapshot};
use crate::components::Icon;
use crate::db::{save_preferences, Preferences};
use dioxus::prelude::*;
use tracing::warn;

fn persist_preferences(snapshot: &SessionSnapshot) {
    let prefs = Preferences {
        background_volume: snapshot.volume,
        background_muted: snapshot.muted,
    };
    spawn(async move {
        if let Err(err) = save_preferences(prefs).await {
            warn!(%err, "could not save preferences");
        }
    });
}

/// Start/stop toggle for the story loop
#[component]
pub(super) fn StartStopButton() -> Element {
    let controller = use_context::<AppController>();
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let looping = snapshot().looping;
    let loading = snapshot().is_loading();

    let on_toggle = move |_| {
        let controller = controller.clone();
        if snapshot.peek().looping {
            controller.stop();
        } else {
            spawn(async move {
                controller.start().await;
            });
        }
    };

    rsx! {
        button {
            id: "story-toggle-btn",
            r#type: "button",
            class: if looping { "story-btn story-btn-stop" } else { "story-btn story-btn-start" },
            onclick: on_toggle,
            if loading {
                Icon { name: "loader".to_string(), class: "story-btn-icon".to_string() }
            } else if looping {
                Icon { name: "stop".to_string(), class: "story-btn-icon".to_string() }
            } else {
                Icon { name: "play".to_string(), class: "story-btn-icon".to_string() }
            }
            if looping {
                "Stop storytelling"
            } else {
                "Start storytelling"
            }
        }
    }
}

/// Background music mute toggle
#[component]
pub(super) fn MuteButton() -> Element {
    let controller = use_context::<AppController>();
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let muted = snapshot().muted;

    rsx! {
        button {
            id: "background-mute-btn",
            r#type: "button",
            class: "story-btn story-btn-mute",
            onclick: move |_| {
                controller.toggle_mute();
                persist_preferences(&controller.snapshot());
            },
            Icon {
                name: if muted { "volume".to_string() } else { "volume-off".to_string() },
                class: "story-btn-icon".to_string(),
            }
            if muted {
                "Unmute music"
            } else {
                "Mute music"
            }
        }
    }
}

#[component]
pub(super) fn VolumeSlider() -> Element {
    let controller = use_context::<AppController>();
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let volume = snapshot().volume;

    let on_input = {
        let controller = controller.clone();
        move |e: Event<FormData>| {
            if let Ok(value) = e.value().parse::<f64>() {
                controller.set_volume(value);
            }
        }
    };

    let on_commit = move |_: Event<FormData>| {
        persist_preferences(&controller.snapshot());
    };

    rsx! {
        div { class: "story-volume",
            label { r#for: "background-volume", "Background volume" }
            input {
                id: "background-volume",
                r#type: "range",
                min: "0",
                max: "1",
                step: "0.01",
                value: "{volume}",
                oninput: on_input,
                onchange: on_commit,
            }
        }
    }
}
