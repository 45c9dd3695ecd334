pub mod error;
pub mod models;
pub mod story_client;

pub use error::FetchError;
pub use models::*;
pub use story_client::{StoryClient, StoryFetcher};
