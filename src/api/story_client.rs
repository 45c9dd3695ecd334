use crate::api::error::FetchError;
use crate::api::models::{Story, StoryResponse};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, info};

const STORY_ENDPOINT: &str = "/api/story";

static CACHE_BUSTER: CacheBuster = CacheBuster::new();

/// Source of new stories. The server picks which one.
#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait StoryFetcher {
    async fn fetch_story(&self) -> Result<Story, FetchError>;
}

/// Hands out strictly increasing millisecond stamps, even when the clock
/// reports the same instant twice.
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    pub fn next(&self, now_ms: i64) -> i64 {
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }
}

impl Default for CacheBuster {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StoryClient {
    base_url: String,
    http: reqwest::Client,
}

impl StoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn story_url(&self) -> String {
        format!("{}{}", self.base_url, STORY_ENDPOINT)
    }

    fn story_from_response(&self, body: StoryResponse, stamp: i64) -> Result<Story, FetchError> {
        let path = body.audio_url.trim();
        if path.is_empty() {
            return Err(FetchError::generic("response is missing audioUrl"));
        }
        Ok(Story {
            text: body.content,
            audio_url: cache_busted_audio_url(&self.base_url, path, stamp),
        })
    }
}

#[async_trait(?Send)]
impl StoryFetcher for StoryClient {
    async fn fetch_story(&self) -> Result<Story, FetchError> {
        let url = self.story_url();
        debug!(%url, "requesting story");

        let response = self.http.get(&url).send().await?;
        check_status(response.status())?;
        let body: StoryResponse = response.json().await?;

        let stamp = CACHE_BUSTER.next(Utc::now().timestamp_millis());
        let story = self.story_from_response(body, stamp)?;
        info!(audio_url = %story.audio_url, "story fetched");
        Ok(story)
    }
}

/// Maps a response status onto the fetch error taxonomy.
pub fn check_status(status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::CONFLICT {
        Err(FetchError::DuplicateConflict)
    } else {
        Err(FetchError::generic(format!("server responded with {status}")))
    }
}

/// Joins the audio path onto the service base and appends the `t` stamp.
pub fn cache_busted_audio_url(base_url: &str, audio_url: &str, stamp: i64) -> String {
    let absolute = if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
        audio_url.to_string()
    } else if audio_url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), audio_url)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), audio_url)
    };
    let separator = if absolute.contains('?') { '&' } else { '?' };
    format!("{absolute}{separator}t={stamp}")
}
