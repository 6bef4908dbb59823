use thiserror::Error;

/// Errors from resolving a UTF-16 offset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Utf16Error {
    /// The offset lies past the end of the text.
    #[error("Offset {offset} is past the end of the text ({len} UTF-16 units)")]
    OutOfBounds {
        /// The offending offset.
        offset: usize,
        /// Length of the text in UTF-16 code units.
        len: usize,
    },
    /// The offset points at the low half of a surrogate pair.
    #[error("Offset {0} falls inside a surrogate pair")]
    InsideSurrogatePair(usize),
}

type Result<T> = std::result::Result<T, Utf16Error>;

/// Returns the length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Lookup table from UTF-16 offsets to byte offsets of a `&str`.
///
/// Telegram measures entity offsets in UTF-16 code units, while Rust strings
/// are sliced by byte. The table holds one entry per UTF-16 unit plus one for
/// the end of the text; entries for the low half of a surrogate pair are
/// `None`, since no byte boundary exists there.
#[derive(Debug, Clone)]
pub struct Utf16Index<'a> {
    text: &'a str,
    byte_offsets: Vec<Option<usize>>,
}

impl<'a> Utf16Index<'a> {
    /// Builds the offset table for `text`.
    pub fn new(text: &'a str) -> Self {
        let mut byte_offsets = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            byte_offsets.push(Some(byte));
            if ch.len_utf16() == 2 {
                byte_offsets.push(None);
            }
        }
        byte_offsets.push(Some(text.len()));

        Self { text, byte_offsets }
    }

    /// Length of the text in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The indexed text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Byte offset of a UTF-16 offset, which must fall on a char boundary.
    pub fn byte_offset(&self, offset: usize) -> Result<usize> {
        match self.byte_offsets.get(offset) {
            Some(Some(byte)) => Ok(*byte),
            Some(None) => Err(Utf16Error::InsideSurrogatePair(offset)),
            None => Err(Utf16Error::OutOfBounds { offset, len: self.len() }),
        }
    }

    /// Slices the text between two UTF-16 offsets.
    pub fn slice(&self, start: usize, end: usize) -> Result<&'a str> {
        let start = self.byte_offset(start)?;
        let end = self.byte_offset(end)?;
        Ok(&self.text[start..end.max(start)])
    }
}
