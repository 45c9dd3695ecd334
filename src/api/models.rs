use serde::{Deserialize, Serialize};

/// A generated story ready for playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub text: String,
    /// Absolute, cache-busted narration URL.
    pub audio_url: String,
}

impl Story {
    pub fn new(text: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_url: audio_url.into(),
        }
    }
}

/// Payload of `GET /api/story`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoryResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "audioUrl")]
    pub audio_url: String,
}

pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let mins = total / 60;
    let secs = total % 60;
    format!("{}:{:02}", mins, secs)
}
