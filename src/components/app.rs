use crate::components::audio_manager::{create_controller, AppController, AudioState};
use crate::components::{StoryPanel, StoryPlayer};
use crate::config::AppConfig;
use crate::db::load_preferences;
use dioxus::prelude::*;
use tracing::{info, warn};

#[component]
pub fn StoryApp() -> Element {
    let config = use_hook(AppConfig::from_build_env);
    let controller = use_hook(|| create_controller(&config));

    rsx! {
        main { class: "storyloop-app",
            h1 { class: "storyloop-title", "Story Loop" }
            match controller {
                Some(controller) => rsx! {
                    StoryShell { controller }
                },
                None => rsx! {
                    p { class: "story-error", "Audio playback is not available on this page." }
                },
            }
        }
    }
}

/// Owns the session for as long as it is mounted.
#[component]
fn StoryShell(controller: AppController) -> Element {
    let snapshot = use_signal(|| controller.snapshot());
    let audio_state = use_hook(AudioState::default);

    use_context_provider(|| controller.clone());
    use_context_provider(|| snapshot);
    use_context_provider(|| audio_state);

    // Publish session changes and hook up narration events once
    {
        let controller = controller.clone();
        use_hook(move || {
            controller.set_observer(move |next| {
                let mut snapshot = snapshot;
                snapshot.set(next);
            });

            #[cfg(target_arch = "wasm32")]
            {
                let mut current_time = audio_state.current_time;
                let mut duration = audio_state.duration;
                crate::components::audio_manager::bind_narration_events(
                    controller,
                    move |time, length| {
                        current_time.set(time);
                        if length.is_finite() {
                            duration.set(length);
                        }
                    },
                );
            }
        });
    }

    // Restore background preferences on mount
    {
        let controller = controller.clone();
        use_effect(move || {
            let controller = controller.clone();
            spawn(async move {
                match load_preferences().await {
                    Ok(prefs) => {
                        controller.set_volume(prefs.background_volume);
                        controller.set_muted(prefs.background_muted);
                    }
                    Err(err) => warn!(%err, "could not load preferences"),
                }
            });
        });
    }

    {
        let controller = controller.clone();
        use_drop(move || {
            controller.set_observer(|_| {});
            controller.stop();
            info!("story session closed");
        });
    }

    rsx! {
        StoryPlayer {}
        StoryPanel {}
    }
}
