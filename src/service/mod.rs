#[cfg(test)]
mod tests;

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use teloxide::types::{Update, UpdateKind};
use thiserror::Error;

use crate::{
    html::HtmlRenderer,
    post::{Post, PostError},
    render::render,
    storage::{PostStore, StorageError},
};

/// Errors returned by the post services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The post store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// A channel message could not be turned into a post.
    #[error("Invalid post: {0}")]
    Post(#[from] PostError),
    /// The updates file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The updates file is not a JSON array of updates.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, ServiceError>;

/// A post with its text rendered to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    /// Message id of the post within its channel.
    pub post_id: i64,
    /// When the post was published.
    pub date: DateTime<Utc>,
    /// Whether the post carries a photo, video or other attachment.
    pub has_media: bool,
    /// The post text as a `<div class="text-content">` fragment.
    pub html: String,
}

/// Loads posts from a store and renders their text.
#[derive(Clone)]
pub struct PostRenderService {
    store: Arc<dyn PostStore>,
    html: HtmlRenderer,
}

impl PostRenderService {
    /// Creates a service reading from `store` and rendering with `html`.
    pub fn new(store: Arc<dyn PostStore>, html: HtmlRenderer) -> Self {
        Self { store, html }
    }

    /// Render a single post, or `None` if it is not stored.
    pub async fn render_post(&self, channel: &str, post_id: i64) -> Result<Option<RenderedPost>> {
        let post = self.store.post(channel, post_id).await?;
        Ok(post.map(|post| self.render_one(&post)))
    }

    /// Render every post of a channel, newest first.
    pub async fn render_channel(&self, channel: &str) -> Result<Vec<RenderedPost>> {
        let posts = self.store.all_posts(channel).await?;
        tracing::debug!("Rendering {} posts for channel: {channel}", posts.len());
        Ok(posts.iter().map(|post| self.render_one(post)).collect())
    }

    fn render_one(&self, post: &Post) -> RenderedPost {
        let segments = render(post.text(), &post.annotations());
        RenderedPost {
            post_id: post.post_id,
            date: post.date,
            has_media: post.has_media,
            html: self.html.render(&segments),
        }
    }
}

/// Stores channel posts received as Bot API updates.
#[derive(Clone)]
pub struct PostIngestService {
    store: Arc<dyn PostStore>,
    channel: String,
}

impl PostIngestService {
    /// Creates a service that stores posts of `channel` in `store`.
    pub fn new(store: Arc<dyn PostStore>, channel: &str) -> Self {
        Self { store, channel: channel.trim_start_matches('@').to_string() }
    }

    /// Stores the post carried by `update`.
    ///
    /// Returns `None` when the update is not a post of the configured channel,
    /// otherwise whether the post was new.
    pub async fn ingest_update(&self, update: &Update) -> Result<Option<bool>> {
        let message = match &update.kind {
            UpdateKind::ChannelPost(message) | UpdateKind::EditedChannelPost(message) => message,
            _ => {
                tracing::debug!("Ignoring update {}: not a channel post", update.id.0);
                return Ok(None);
            }
        };

        if message.chat.username().is_some_and(|username| username != self.channel) {
            tracing::debug!("Ignoring update {}: post from another channel", update.id.0);
            return Ok(None);
        }

        let post = Post::from_channel_message(message, &self.channel)?;
        let post_id = post.post_id;
        let inserted = self.store.upsert_post(post).await?;
        tracing::debug!(
            "{} post {post_id} for channel: {}",
            if inserted { "Stored new" } else { "Updated" },
            self.channel
        );
        Ok(Some(inserted))
    }

    /// Stores the channel posts from a JSON array of Bot API updates and
    /// returns how many were stored.
    ///
    /// Updates that do not make a valid post are skipped; storage errors abort.
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let updates: Vec<Update> = serde_json::from_slice(&tokio::fs::read(path).await?)?;
        tracing::info!("Ingesting {} updates from {}", updates.len(), path.display());

        let mut stored = 0;
        for update in &updates {
            match self.ingest_update(update).await {
                Ok(Some(_)) => stored += 1,
                Ok(None) => {}
                Err(ServiceError::Post(e)) => {
                    tracing::warn!("Skipping update {}: {e}", update.id.0);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stored)
    }
}
