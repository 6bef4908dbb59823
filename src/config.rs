use std::env::{self, VarError};

const DEFAULT_POSTS_FILE: &str = "data/posts.json";
const DEFAULT_OPEN_LINKS_IN_NEW_TAB: bool = true;

/// Represents the application configuration.
#[derive(Debug)]
pub struct Config {
    /// The username of the mirrored channel, without the leading `@`.
    pub channel_username: String,
    /// Path to the JSON file holding the channel's posts.
    pub posts_file: String,
    /// Whether rendered links open in a new browser tab.
    pub open_links_in_new_tab: bool,
    /// Optional JSON file of Bot API updates to store before rendering.
    pub updates_file: Option<String>,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    pub fn from_env() -> Result<Self, VarError> {
        Ok(Self {
            channel_username: env::var("CHANNEL_USERNAME")?.trim_start_matches('@').to_string(),
            posts_file: env::var("POSTS_FILE").unwrap_or_else(|_| DEFAULT_POSTS_FILE.to_string()),
            open_links_in_new_tab: env::var("OPEN_LINKS_IN_NEW_TAB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_OPEN_LINKS_IN_NEW_TAB),
            updates_file: env::var("UPDATES_FILE").ok().filter(|v| !v.trim().is_empty()),
        })
    }
}
