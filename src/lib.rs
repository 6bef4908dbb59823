//! Renders posts mirrored from a Telegram channel.
//!
//! Telegram delivers formatting as a list of entities with UTF-16 offsets
//! into the message text. This crate turns a message and its entities into
//! ordered, styled segments and renders those to escaped HTML.

#![warn(missing_docs)]

/// The configuration for the application.
pub mod config;
/// Formatting annotations and their wire formats.
pub mod entity;
/// HTML output for rendered segments.
pub mod html;
/// Channel posts and their ingestion from Telegram messages.
pub mod post;
/// Splitting message text into styled segments.
pub mod render;
/// Ingesting and rendering stored posts.
pub mod service;
/// The storage layer for channel posts.
pub mod storage;
/// UTF-16 offset handling.
pub mod utf16;

use std::sync::Arc;

use crate::{
    config::Config,
    html::{HtmlOptions, HtmlRenderer},
    service::{PostIngestService, PostRenderService},
    storage::json::JsonPostStore,
};

/// Stores the posts from `UPDATES_FILE`, if set, then renders every stored
/// post of the configured channel to stdout.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let store = Arc::new(JsonPostStore::open(&config.posts_file).await?);

    if let Some(updates_file) = &config.updates_file {
        let ingest = PostIngestService::new(store.clone(), &config.channel_username);
        let stored = ingest.ingest_file(updates_file).await?;
        tracing::info!("Stored {stored} posts from {updates_file}");
    }

    let html = HtmlRenderer::new(HtmlOptions { open_links_in_new_tab: config.open_links_in_new_tab });
    let service = PostRenderService::new(store, html);

    let posts = service.render_channel(&config.channel_username).await?;
    tracing::info!("Rendered {} posts from @{}", posts.len(), config.channel_username);

    for post in posts {
        println!(
            r#"<article data-post-id="{}" data-date="{}">{}</article>"#,
            post.post_id,
            post.date.to_rfc3339(),
            post.html
        );
    }

    Ok(())
}
