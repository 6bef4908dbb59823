use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};

use crate::{
    post::Post,
    storage::{PostStore, StorageResult},
};

/// Post storage backed by a single JSON array file.
///
/// The whole file is loaded on open and rewritten on every upsert.
pub struct JsonPostStore {
    path: PathBuf,
    posts: Mutex<Vec<Post>>,
}

impl JsonPostStore {
    /// Opens the posts file at `path`. A missing file is treated as empty.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!("Opening posts file: {}", path.display());

        let posts = match fs::read(&path).await {
            Ok(bytes) => parse_posts(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Posts file {} does not exist yet", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Loaded {} posts", posts.len());

        Ok(Self { path, posts: Mutex::new(posts) })
    }

    async fn persist(&self, posts: &[Post]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Write next to the target and rename so readers never see a partial file.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(posts)?).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// Parses the posts array, skipping records that are not valid posts.
fn parse_posts(bytes: &[u8]) -> StorageResult<Vec<Post>> {
    let records: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;

    let mut posts: Vec<Post> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Post>(record) {
            Ok(post) => match post.validate() {
                Ok(()) => Some(post),
                Err(e) => {
                    tracing::warn!("Skipping invalid post {}: {e}", post.post_id);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Skipping unreadable post record: {e}");
                None
            }
        })
        .collect();

    sort_newest_first(&mut posts);
    Ok(posts)
}

fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.post_id.cmp(&a.post_id)));
}

#[async_trait]
impl PostStore for JsonPostStore {
    async fn all_posts(&self, channel: &str) -> StorageResult<Vec<Post>> {
        tracing::debug!("Getting all posts for channel: {channel}");
        let posts = self.posts.lock().await;
        Ok(posts.iter().filter(|p| p.channel_username == channel).cloned().collect())
    }

    async fn post(&self, channel: &str, post_id: i64) -> StorageResult<Option<Post>> {
        tracing::debug!("Getting post {post_id} for channel: {channel}");
        let posts = self.posts.lock().await;
        Ok(posts.iter().find(|p| p.channel_username == channel && p.post_id == post_id).cloned())
    }

    async fn upsert_post(&self, post: Post) -> StorageResult<bool> {
        tracing::debug!("Storing post {} for channel: {}", post.post_id, post.channel_username);
        let mut posts = self.posts.lock().await;

        // Only publish the new state once it is on disk.
        let mut updated = posts.clone();
        let existing = updated
            .iter_mut()
            .find(|p| p.channel_username == post.channel_username && p.post_id == post.post_id);
        let inserted = match existing {
            Some(existing) => {
                *existing = post;
                false
            }
            None => {
                updated.push(post);
                true
            }
        };

        sort_newest_first(&mut updated);
        self.persist(&updated).await?;
        *posts = updated;
        Ok(inserted)
    }
}
