//! Errors raised while fetching stories.

use thiserror::Error;

/// Failure of a single story request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server rejected the candidate because it repeats recent history (HTTP 409).
    #[error("story repeats recent history")]
    DuplicateConflict,

    /// Any other transport, status or decoding failure.
    #[error("story request failed: {0}")]
    GenericFailure(String),
}

impl FetchError {
    pub fn generic(reason: impl Into<String>) -> Self {
        Self::GenericFailure(reason.into())
    }

    /// Text shown to the listener.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::DuplicateConflict => {
                "This story repeats one you heard recently. Please try again."
            }
            Self::GenericFailure(_) => "Could not fetch a new story.",
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateConflict)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::GenericFailure(err.to_string())
    }
}
