
use serde::{Deserialize, Serialize};
use teloxide::types::{MessageEntity, MessageEntityKind};
use thiserror::Error;

/// Reasons an entity cannot be applied to a message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// The wire offset is negative.
    #[error("Entity '{kind}' has a negative offset: {offset}")]
    NegativeOffset {
        /// Wire name of the entity.
        kind: String,
        /// The offending offset.
        offset: i64,
    },
    /// The wire length is negative.
    #[error("Entity '{kind}' has a negative length: {length}")]
    NegativeLength {
        /// Wire name of the entity.
        kind: String,
        /// The offending length.
        length: i64,
    },
    /// A `text_link` without a destination.
    #[error("Entity 'text_link' at offset {0} has no url")]
    MissingUrl(usize),
    /// The span reaches past the end of the text.
    #[error("Entity spans {start}..{end}, but the text is {len} UTF-16 units long")]
    OutOfBounds {
        /// Start of the span.
        start: usize,
        /// Exclusive end of the span.
        end: usize,
        /// Length of the text in UTF-16 code units.
        len: usize,
    },
    /// A boundary of the span splits a surrogate pair.
    #[error("Entity boundary {0} falls inside a surrogate pair")]
    SplitsSurrogate(usize),
}

/// What an annotation does to the span of text it covers.
///
/// Only the kinds that need extra data carry it, so a hashtag can never have
/// a link target attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Inline monospace.
    Code,
    /// Monospace block with an optional language label.
    Pre {
        /// Language label, if the sender gave one.
        language: Option<String>,
    },
    /// Link whose label is the text and whose destination is `url`.
    TextLink {
        /// Link destination.
        url: String,
    },
    /// URL detected in the text itself.
    Url,
    /// `@username` reference.
    Mention,
    /// `#tag` reference.
    Hashtag,
    /// Text hidden until clicked.
    Spoiler,
    /// Any kind this crate does not know about. Holds the wire name.
    Unrecognized(String),
}

impl AnnotationKind {
    /// Name of this kind in the Bot API wire format.
    pub fn wire_name(&self) -> &str {
        match self {
            AnnotationKind::Bold => "bold",
            AnnotationKind::Italic => "italic",
            AnnotationKind::Underline => "underline",
            AnnotationKind::Strikethrough => "strikethrough",
            AnnotationKind::Code => "code",
            AnnotationKind::Pre { .. } => "pre",
            AnnotationKind::TextLink { .. } => "text_link",
            AnnotationKind::Url => "url",
            AnnotationKind::Mention => "mention",
            AnnotationKind::Hashtag => "hashtag",
            AnnotationKind::Spoiler => "spoiler",
            AnnotationKind::Unrecognized(name) => name,
        }
    }
}

/// A formatting annotation over `[offset, offset + length)` of a message,
/// measured in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    /// Start of the span.
    pub offset: usize,
    /// Length of the span.
    pub length: usize,
    /// What the span means.
    pub kind: AnnotationKind,
}

impl Annotation {
    /// Creates an annotation of `kind` covering `length` units from `offset`.
    pub fn new(kind: AnnotationKind, offset: usize, length: usize) -> Self {
        Self { offset, length, kind }
    }

    /// Exclusive end of the span. Saturates instead of overflowing so a
    /// hostile length is caught by the bounds check.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}

/// An entity as it appears in Bot API JSON and in the stored posts file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Wire name of the kind, such as `bold` or `text_link`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start of the span in UTF-16 code units.
    pub offset: i64,
    /// Length of the span in UTF-16 code units.
    pub length: i64,
    /// Destination of a `text_link`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Language of a `pre` block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TryFrom<RawEntity> for Annotation {
    type Error = AnnotationError;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let offset = usize::try_from(raw.offset).map_err(|_| {
            AnnotationError::NegativeOffset { kind: raw.kind.clone(), offset: raw.offset }
        })?;
        let length = usize::try_from(raw.length).map_err(|_| {
            AnnotationError::NegativeLength { kind: raw.kind.clone(), length: raw.length }
        })?;

        let kind = match raw.kind.as_str() {
            "bold" => AnnotationKind::Bold,
            "italic" => AnnotationKind::Italic,
            "underline" => AnnotationKind::Underline,
            "strikethrough" => AnnotationKind::Strikethrough,
            "code" => AnnotationKind::Code,
            "pre" => AnnotationKind::Pre { language: raw.language },
            "text_link" => {
                let url = raw.url.ok_or(AnnotationError::MissingUrl(offset))?;
                AnnotationKind::TextLink { url }
            }
            "url" => AnnotationKind::Url,
            "mention" => AnnotationKind::Mention,
            "hashtag" => AnnotationKind::Hashtag,
            "spoiler" => AnnotationKind::Spoiler,
            _ => AnnotationKind::Unrecognized(raw.kind),
        };

        Ok(Annotation { offset, length, kind })
    }
}

impl From<&Annotation> for RawEntity {
    fn from(annotation: &Annotation) -> Self {
        let (url, language) = match &annotation.kind {
            AnnotationKind::TextLink { url } => (Some(url.clone()), None),
            AnnotationKind::Pre { language } => (None, language.clone()),
            _ => (None, None),
        };

        RawEntity {
            kind: annotation.kind.wire_name().to_string(),
            offset: annotation.offset as i64,
            length: annotation.length as i64,
            url,
            language,
        }
    }
}

impl From<&MessageEntity> for Annotation {
    fn from(entity: &MessageEntity) -> Self {
        let kind = match &entity.kind {
            MessageEntityKind::Bold => AnnotationKind::Bold,
            MessageEntityKind::Italic => AnnotationKind::Italic,
            MessageEntityKind::Underline => AnnotationKind::Underline,
            MessageEntityKind::Strikethrough => AnnotationKind::Strikethrough,
            MessageEntityKind::Code => AnnotationKind::Code,
            MessageEntityKind::Pre { language } => {
                AnnotationKind::Pre { language: language.clone() }
            }
            MessageEntityKind::TextLink { url } => {
                AnnotationKind::TextLink { url: url.to_string() }
            }
            MessageEntityKind::Url => AnnotationKind::Url,
            MessageEntityKind::Mention => AnnotationKind::Mention,
            MessageEntityKind::Hashtag => AnnotationKind::Hashtag,
            MessageEntityKind::Spoiler => AnnotationKind::Spoiler,
            other => AnnotationKind::Unrecognized(teloxide_kind_name(other)),
        };

        Annotation { offset: entity.offset, length: entity.length, kind }
    }
}

/// Recovers the wire name (`"cashtag"`, `"text_mention"`, ...) of a teloxide
/// entity kind from its serde tag.
fn teloxide_kind_name(kind: &MessageEntityKind) -> String {
    serde_json::to_value(kind)
        .ok()
        .and_then(|value| value.get("type").and_then(|t| t.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts stored entities into annotations, dropping and logging the ones
/// that are malformed.
pub fn annotations_from_raw(raw: &[RawEntity]) -> Vec<Annotation> {
    raw.iter()
        .cloned()
        .filter_map(|entity| match Annotation::try_from(entity) {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                tracing::warn!("Dropping malformed entity: {e}");
                None
            }
        })
        .collect()
}
