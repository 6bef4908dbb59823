#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::Message;
use thiserror::Error;

use crate::entity::{Annotation, RawEntity, annotations_from_raw};

/// Reasons a post is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostError {
    /// The channel username is blank.
    #[error("Post has an empty channel username")]
    EmptyChannel,
    /// Post ids start at 1.
    #[error("Invalid post id: {0}")]
    InvalidPostId(i64),
    /// The timestamp is not after the Unix epoch.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// A channel post as stored in the posts file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Channel username without the leading `@`.
    pub channel_username: String,
    /// Telegram message id within the channel.
    pub post_id: i64,
    /// When the post was published.
    pub date: DateTime<Utc>,
    /// Unix timestamp, used for ordering.
    pub timestamp: i64,
    /// Message text, or the caption of a media post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Formatting entities of `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<RawEntity>>,
    /// Whether the post has an attachment.
    pub has_media: bool,
    /// View count, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl Post {
    /// Checks the fields every stored post must have.
    pub fn validate(&self) -> Result<(), PostError> {
        if self.channel_username.trim().is_empty() {
            return Err(PostError::EmptyChannel);
        }
        if self.post_id <= 0 {
            return Err(PostError::InvalidPostId(self.post_id));
        }
        if self.timestamp <= 0 {
            return Err(PostError::InvalidTimestamp(self.timestamp));
        }
        Ok(())
    }

    /// The post text, empty if it has none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// The post's entities as annotations. Malformed entities are dropped.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.entities.as_deref().map(annotations_from_raw).unwrap_or_default()
    }

    /// Builds a post from a channel message.
    ///
    /// Media posts carry their text in the caption, so the caption and its
    /// entities are used when the message has no text.
    pub fn from_channel_message(message: &Message, channel: &str) -> Result<Self, PostError> {
        let (text, entities) = match message.text() {
            Some(text) => (Some(text), message.entities()),
            None => (message.caption(), message.caption_entities()),
        };

        let entities = entities
            .filter(|entities| !entities.is_empty())
            .map(|entities| {
                entities.iter().map(|e| RawEntity::from(&Annotation::from(e))).collect::<Vec<_>>()
            });

        let has_media = message.photo().is_some()
            || message.video().is_some()
            || message.document().is_some()
            || message.audio().is_some()
            || message.voice().is_some()
            || message.animation().is_some()
            || message.sticker().is_some();

        let post = Post {
            channel_username: channel.trim_start_matches('@').to_string(),
            post_id: i64::from(message.id.0),
            date: message.date,
            timestamp: message.date.timestamp(),
            text: text.map(str::to_owned),
            entities,
            has_media,
            views: None,
        };

        post.validate()?;
        Ok(post)
    }
}
