use chrono::TimeZone;
use serde_json::json;
use teloxide::types::Message;

use super::*;
use crate::entity::AnnotationKind;

fn sample_post() -> Post {
    Post {
        channel_username: "news".to_string(),
        post_id: 42,
        date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        timestamp: 1_700_000_000,
        text: Some("Hello world".to_string()),
        entities: None,
        has_media: false,
        views: None,
    }
}

fn channel_message(fields: serde_json::Value) -> Message {
    let mut message = json!({
        "message_id": 42,
        "date": 1_700_000_000,
        "chat": { "id": -1001234567890i64, "type": "channel", "title": "News", "username": "news" },
        "sender_chat": {
            "id": -1001234567890i64,
            "type": "channel",
            "title": "News",
            "username": "news"
        }
    });
    if let (Some(message), Some(fields)) = (message.as_object_mut(), fields.as_object()) {
        message.extend(fields.clone());
    }
    serde_json::from_value(message).unwrap()
}

#[test]
fn test_post_from_json() {
    let json = r#"{
        "channelUsername": "news",
        "postId": 7,
        "date": "2024-03-01T12:00:00Z",
        "timestamp": 1709294400,
        "text": "Bold move",
        "entities": [{"type": "bold", "offset": 0, "length": 4}],
        "hasMedia": true,
        "views": 120
    }"#;
    let post: Post = serde_json::from_str(json).unwrap();

    assert_eq!(post.post_id, 7);
    assert_eq!(post.date.timestamp(), 1_709_294_400);
    assert!(post.has_media);
    assert_eq!(post.views, Some(120));
    assert_eq!(post.annotations(), vec![Annotation::new(AnnotationKind::Bold, 0, 4)]);
    assert!(post.validate().is_ok());
}

#[test]
fn test_post_without_text() {
    let post = Post { text: None, ..sample_post() };
    assert_eq!(post.text(), "");
    assert!(post.annotations().is_empty());
}

#[test]
fn test_post_serializes_camel_case() {
    let value = serde_json::to_value(sample_post()).unwrap();
    assert_eq!(value["channelUsername"], "news");
    assert_eq!(value["postId"], 42);
    assert_eq!(value["hasMedia"], false);
    assert!(value.get("entities").is_none());
}

#[test]
fn test_validate() {
    assert_eq!(
        Post { channel_username: " ".to_string(), ..sample_post() }.validate(),
        Err(PostError::EmptyChannel)
    );
    assert_eq!(Post { post_id: 0, ..sample_post() }.validate(), Err(PostError::InvalidPostId(0)));
    assert_eq!(
        Post { timestamp: -1, ..sample_post() }.validate(),
        Err(PostError::InvalidTimestamp(-1))
    );
}

#[test]
fn test_from_channel_message_text() {
    let message = channel_message(json!({
        "text": "Hello #news",
        "entities": [
            { "type": "bold", "offset": 0, "length": 5 },
            { "type": "hashtag", "offset": 6, "length": 5 }
        ]
    }));

    let post = Post::from_channel_message(&message, "@news").unwrap();

    assert_eq!(post.channel_username, "news");
    assert_eq!(post.post_id, 42);
    assert_eq!(post.timestamp, 1_700_000_000);
    assert_eq!(post.text(), "Hello #news");
    assert!(!post.has_media);
    assert_eq!(
        post.annotations(),
        vec![
            Annotation::new(AnnotationKind::Bold, 0, 5),
            Annotation::new(AnnotationKind::Hashtag, 6, 5),
        ]
    );
}

#[test]
fn test_from_channel_message_caption() {
    let message = channel_message(json!({
        "photo": [{
            "file_id": "AgACAgIAAxkBAAIBY2",
            "file_unique_id": "AQADBbkxG",
            "width": 90,
            "height": 67,
            "file_size": 1234
        }],
        "caption": "Look here",
        "caption_entities": [{ "type": "italic", "offset": 5, "length": 4 }]
    }));

    let post = Post::from_channel_message(&message, "news").unwrap();

    assert!(post.has_media);
    assert_eq!(post.text(), "Look here");
    assert_eq!(post.annotations(), vec![Annotation::new(AnnotationKind::Italic, 5, 4)]);
}

#[test]
fn test_from_channel_message_without_channel() {
    let message = channel_message(json!({ "text": "hi" }));
    assert_eq!(Post::from_channel_message(&message, ""), Err(PostError::EmptyChannel));
}
