use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mockall::predicate::{eq, function};
use serde_json::json;
use teloxide::types::Update;

use super::*;
use crate::{
    entity::RawEntity,
    html::HtmlOptions,
    storage::MockPostStore,
};

fn post(post_id: i64, text: &str, entities: Option<Vec<RawEntity>>) -> Post {
    Post {
        channel_username: "news".to_string(),
        post_id,
        date: Utc.timestamp_opt(1_700_000_000 + post_id, 0).unwrap(),
        timestamp: 1_700_000_000 + post_id,
        text: Some(text.to_string()),
        entities,
        has_media: false,
        views: None,
    }
}

fn service(store: MockPostStore) -> PostRenderService {
    PostRenderService::new(
        Arc::new(store),
        HtmlRenderer::new(HtmlOptions { open_links_in_new_tab: false }),
    )
}

#[tokio::test]
async fn test_render_post() {
    let mut store = MockPostStore::new();
    let entities = vec![RawEntity {
        kind: "bold".to_string(),
        offset: 0,
        length: 5,
        url: None,
        language: None,
    }];
    let stored = post(1, "Hello world", Some(entities));
    store
        .expect_post()
        .with(eq("news"), eq(1))
        .times(1)
        .returning(move |_, _| Ok(Some(stored.clone())));

    let rendered = service(store).render_post("news", 1).await.unwrap().unwrap();

    assert_eq!(rendered.post_id, 1);
    assert_eq!(rendered.html, r#"<div class="text-content"><strong>Hello</strong> world</div>"#);
}

#[tokio::test]
async fn test_render_missing_post() {
    let mut store = MockPostStore::new();
    store.expect_post().returning(|_, _| Ok(None));

    let rendered = service(store).render_post("news", 99).await.unwrap();
    assert!(rendered.is_none());
}

#[tokio::test]
async fn test_render_channel_keeps_store_order() {
    let mut store = MockPostStore::new();
    let posts = vec![post(2, "second", None), post(1, "first <b>", None)];
    store.expect_all_posts().with(eq("news")).returning(move |_| Ok(posts.clone()));

    let rendered = service(store).render_channel("news").await.unwrap();

    let ids: Vec<_> = rendered.iter().map(|p| p.post_id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(rendered[1].html, r#"<div class="text-content">first &lt;b&gt;</div>"#);
}

#[tokio::test]
async fn test_malformed_entities_do_not_blank_the_post() {
    let mut store = MockPostStore::new();
    let entities = vec![
        RawEntity { kind: "italic".to_string(), offset: 1, length: 10, url: None, language: None },
        RawEntity { kind: "spoiler".to_string(), offset: 0, length: 1, url: None, language: None },
    ];
    let stored = post(3, "abc", Some(entities));
    store.expect_post().returning(move |_, _| Ok(Some(stored.clone())));

    let rendered = service(store).render_post("news", 3).await.unwrap().unwrap();
    assert_eq!(
        rendered.html,
        r#"<div class="text-content"><span class="spoiler">a</span>bc</div>"#
    );
}

#[tokio::test]
async fn test_storage_error_is_propagated() {
    let mut store = MockPostStore::new();
    store.expect_all_posts().returning(|_| {
        Err(StorageError::Io(std::io::Error::other("disk gone")))
    });

    let result = service(store).render_channel("news").await;
    assert!(matches!(result, Err(ServiceError::Storage(StorageError::Io(_)))));
}

fn channel_update_json(kind: &str, channel: &str, message_id: i32, date: i64) -> serde_json::Value {
    let chat = json!({ "id": -1001234567890i64, "type": "channel", "title": "News", "username": channel });
    json!({
        "update_id": 10,
        kind: {
            "message_id": message_id,
            "date": date,
            "chat": chat,
            "sender_chat": chat,
            "text": "Hello world",
            "entities": [{ "type": "bold", "offset": 0, "length": 5 }]
        }
    })
}

fn channel_update(kind: &str, channel: &str, message_id: i32) -> Update {
    serde_json::from_str(&channel_update_json(kind, channel, message_id, 1_700_000_000).to_string()).unwrap()
}

fn ingest_service(store: MockPostStore) -> PostIngestService {
    PostIngestService::new(Arc::new(store), "@news")
}

#[tokio::test]
async fn test_ingest_channel_post() {
    let mut store = MockPostStore::new();
    store
        .expect_upsert_post()
        .with(function(|post: &Post| {
            post.channel_username == "news"
                && post.post_id == 42
                && post.text() == "Hello world"
                && post.annotations().len() == 1
        }))
        .times(1)
        .returning(|_| Ok(true));

    let result = ingest_service(store).ingest_update(&channel_update("channel_post", "news", 42)).await;
    assert_eq!(result.unwrap(), Some(true));
}

#[tokio::test]
async fn test_ingest_edited_post_replaces_it() {
    let mut store = MockPostStore::new();
    store.expect_upsert_post().times(1).returning(|_| Ok(false));

    let update = channel_update("edited_channel_post", "news", 42);
    assert_eq!(ingest_service(store).ingest_update(&update).await.unwrap(), Some(false));
}

#[tokio::test]
async fn test_ingest_skips_other_channels() {
    let mut store = MockPostStore::new();
    store.expect_upsert_post().never();

    let update = channel_update("channel_post", "elsewhere", 42);
    assert_eq!(ingest_service(store).ingest_update(&update).await.unwrap(), None);
}

#[tokio::test]
async fn test_ingest_skips_non_channel_updates() {
    let mut store = MockPostStore::new();
    store.expect_upsert_post().never();

    let update: Update = serde_json::from_value(json!({
        "update_id": 11,
        "message": {
            "message_id": 5,
            "date": 1_700_000_000,
            "chat": { "id": 99, "type": "private", "first_name": "Ann" },
            "from": { "id": 99, "is_bot": false, "first_name": "Ann" },
            "text": "hi"
        }
    }))
    .unwrap();
    assert_eq!(ingest_service(store).ingest_update(&update).await.unwrap(), None);
}

#[tokio::test]
async fn test_ingest_storage_error_is_propagated() {
    let mut store = MockPostStore::new();
    store
        .expect_upsert_post()
        .returning(|_| Err(StorageError::Io(std::io::Error::other("read-only"))));

    let result = ingest_service(store).ingest_update(&channel_update("channel_post", "news", 42)).await;
    assert!(matches!(result, Err(ServiceError::Storage(StorageError::Io(_)))));
}

#[tokio::test]
async fn test_ingest_file_skips_invalid_posts() {
    let mut store = MockPostStore::new();
    store
        .expect_upsert_post()
        .with(function(|post: &Post| post.post_id == 42))
        .times(1)
        .returning(|_| Ok(true));

    let updates = json!([
        channel_update_json("channel_post", "news", 42, 1_700_000_000),
        // A zero date makes an invalid post.
        channel_update_json("channel_post", "news", 43, 0),
        channel_update_json("channel_post", "elsewhere", 44, 1_700_000_000),
    ]);

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("updates.json");
    tokio::fs::write(&path, updates.to_string()).await.unwrap();

    assert_eq!(ingest_service(store).ingest_file(&path).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ingest_missing_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = ingest_service(MockPostStore::new()).ingest_file(dir.path().join("none.json")).await;
    assert!(matches!(result, Err(ServiceError::Io(_))));
}

