/// Storage in a JSON file.
pub mod json;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::post::Post;

/// Errors from the post store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the posts file failed.
    #[error("Failed to access posts file: {0}")]
    Io(#[from] std::io::Error),
    /// The posts file could not be parsed or written as JSON.
    #[error("Posts file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type of [`PostStore`] operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Source of channel posts for rendering.
#[automock]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Get all posts of a channel, newest first.
    async fn all_posts(&self, channel: &str) -> StorageResult<Vec<Post>>;

    /// Get a single post by its Telegram message id.
    async fn post(&self, channel: &str, post_id: i64) -> StorageResult<Option<Post>>;

    /// Insert a post, or replace the stored one with the same channel and id.
    /// Returns `true` if the post was not stored before.
    async fn upsert_post(&self, post: Post) -> StorageResult<bool>;
}
