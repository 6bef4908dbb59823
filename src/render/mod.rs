
use crate::{
    entity::{Annotation, AnnotationError, AnnotationKind},
    utf16::{Utf16Error, Utf16Index},
};

/// Base of the link a mention points to.
pub const MENTION_BASE_URL: &str = "https://t.me/";

/// How a segment should be presented.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Style {
    /// No formatting.
    Plain,
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
    /// Monospace block.
    Pre {
        /// Language label shown above the block.
        language: Option<String>,
    },
    /// Link with a label that differs from its destination.
    TextLink {
        /// Link destination.
        target: String,
    },
    /// Link whose label is the URL itself.
    Url {
        /// Link destination, the segment text.
        target: String,
    },
    /// Link to a Telegram user or channel.
    Mention {
        /// The `t.me` link for the handle.
        target: String,
    },
    /// Hashtag.
    Hashtag,
    /// Text hidden until clicked.
    Spoiler,
}

/// One contiguous, uniformly styled run of the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// UTF-16 offset of the first unit of `text` within the message.
    pub offset: usize,
    /// The text of the run.
    pub text: String,
    /// How the run is presented.
    pub style: Style,
}

impl Segment {
    /// Creates an unformatted segment.
    pub fn plain(offset: usize, text: impl Into<String>) -> Self {
        Self { offset, text: text.into(), style: Style::Plain }
    }

    /// Whether the segment carries no formatting.
    pub fn is_plain(&self) -> bool {
        self.style == Style::Plain
    }
}

/// Checks that an annotation lies within `index` and that neither of its
/// boundaries splits a surrogate pair.
pub fn validate(index: &Utf16Index<'_>, annotation: &Annotation) -> Result<(), AnnotationError> {
    let (start, end) = (annotation.offset, annotation.end());
    if end > index.len() {
        return Err(AnnotationError::OutOfBounds { start, end, len: index.len() });
    }
    for boundary in [start, end] {
        if let Err(Utf16Error::InsideSurrogatePair(offset)) = index.byte_offset(boundary) {
            return Err(AnnotationError::SplitsSurrogate(offset));
        }
    }
    Ok(())
}

/// Splits `message` into styled segments according to `annotations`.
///
/// Annotations may come in any order; they are stable-sorted by offset first,
/// so equal offsets keep their input order. Malformed annotations are logged
/// and skipped. An annotation starting inside an earlier one is clipped to
/// begin where the earlier one ended, and one fully covered by an earlier
/// annotation is skipped. The texts of the returned segments always
/// concatenate back to `message`.
pub fn render(message: &str, annotations: &[Annotation]) -> Vec<Segment> {
    if message.is_empty() {
        return Vec::new();
    }
    if annotations.is_empty() {
        return vec![Segment::plain(0, message)];
    }

    let index = Utf16Index::new(message);
    let mut sorted: Vec<&Annotation> = annotations.iter().collect();
    sorted.sort_by_key(|annotation| annotation.offset);

    let mut segments = Vec::with_capacity(sorted.len() * 2 + 1);
    let mut cursor = 0;

    for annotation in sorted {
        if let Err(e) = validate(&index, annotation) {
            tracing::warn!("Skipping entity '{}': {e}", annotation.kind.wire_name());
            continue;
        }

        let end = annotation.end();
        if annotation.length == 0 {
            continue;
        }
        if end <= cursor {
            tracing::debug!(
                "Skipping entity '{}' at {} nested inside a previous entity",
                annotation.kind.wire_name(),
                annotation.offset
            );
            continue;
        }
        let start = annotation.offset.max(cursor);

        if start > cursor {
            push_slice(&mut segments, &index, cursor, start, |_| Style::Plain);
        }
        push_slice(&mut segments, &index, start, end, |text| style_for(&annotation.kind, text));
        cursor = end;
    }

    if cursor < index.len() {
        push_slice(&mut segments, &index, cursor, index.len(), |_| Style::Plain);
    }

    segments
}

fn push_slice(
    segments: &mut Vec<Segment>,
    index: &Utf16Index<'_>,
    start: usize,
    end: usize,
    style: impl FnOnce(&str) -> Style,
) {
    // Bounds were validated above; the cursor only ever sits on boundaries.
    match index.slice(start, end) {
        Ok(text) => {
            let style = style(text);
            segments.push(Segment { offset: start, text: text.to_string(), style });
        }
        Err(e) => tracing::error!("Failed to slice {start}..{end}: {e}"),
    }
}

fn style_for(kind: &AnnotationKind, text: &str) -> Style {
    match kind {
        AnnotationKind::Bold => Style::Bold,
        AnnotationKind::Italic => Style::Italic,
        AnnotationKind::Underline => Style::Underline,
        AnnotationKind::Strikethrough => Style::Strikethrough,
        AnnotationKind::Code => Style::Code,
        AnnotationKind::Pre { language } => Style::Pre { language: language.clone() },
        AnnotationKind::TextLink { url } => Style::TextLink { target: url.clone() },
        AnnotationKind::Url => Style::Url { target: text.to_string() },
        AnnotationKind::Mention => Style::Mention { target: mention_target(text) },
        AnnotationKind::Hashtag => Style::Hashtag,
        AnnotationKind::Spoiler => Style::Spoiler,
        AnnotationKind::Unrecognized(_) => Style::Plain,
    }
}

/// Builds the channel link for a mention such as `@rustlang`.
pub fn mention_target(text: &str) -> String {
    let handle = text.strip_prefix('@').unwrap_or(text);
    format!("{MENTION_BASE_URL}{handle}")
}

/// Concatenates the text of all segments.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(|segment| segment.text.as_str()).collect()
}
