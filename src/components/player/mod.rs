mod controls;

use crate::api::models::format_duration;
use crate::components::audio_manager::AudioState;
use controls::{MuteButton, StartStopButton, VolumeSlider};
use dioxus::prelude::*;

#[component]
pub fn StoryPlayer() -> Element {
    let audio_state = use_context::<AudioState>();

    let current_time = (audio_state.current_time)();
    let duration = (audio_state.duration)();
    let progress = if duration > 0.0 {
        (current_time / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    rsx! {
        section { class: "story-player",
            div { class: "story-progress",
                span { class: "story-progress-time", "{format_duration(current_time)}" }
                div { class: "story-progress-track",
                    div {
                        class: "story-progress-fill",
                        style: "width: {progress}%",
                    }
                }
                span { class: "story-progress-time", "{format_duration(duration)}" }
            }
            div { class: "story-controls",
                StartStopButton {}
                MuteButton {}
            }
            VolumeSlider {}
        }
    }
}
