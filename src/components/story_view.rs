use crate::components::audio_manager::SessionSnapshot;
use crate::components::Icon;
use dioxus::prelude::*;

/// Loading state, last error and the text of the current story
#[component]
pub fn StoryPanel() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let current = snapshot();

    rsx! {
        if current.is_loading() {
            p { class: "story-status",
                Icon { name: "loader".to_string(), class: "story-status-icon".to_string() }
                "Generating story…"
            }
        }
        if let Some(message) = current.message.clone() {
            p { class: "story-error", role: "alert", "{message}" }
        }
        if let Some(text) = current.story_text.clone() {
            article { class: "story-text",
                h2 {
                    Icon { name: "book".to_string(), class: "story-heading-icon".to_string() }
                    "Story"
                    if current.has_pending {
                        span { class: "story-next", "Next story ready" }
                    }
                }
                p { "{text}" }
            }
        }
    }
}
