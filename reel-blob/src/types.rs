use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content.
///
/// Errors are `std::io::Error` so the stream can be handed to any
/// transport body unchanged; a yielded error ends the stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Unique identifier for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobId(pub String);

impl BlobId {
    /// Generate a new random blob ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is safe to use as a single path segment.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 128
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Request to store a blob
#[derive(Debug, Clone, Default)]
pub struct BlobPut {
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub size_hint: Option<u64>,
}

impl BlobPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }
}

/// Byte range for partial reads, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>, // None means "to end of object"
}

impl ByteRange {
    pub fn from_start(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn bounded(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    fn is_valid(&self, total_size: u64) -> bool {
        if self.start >= total_size {
            return false;
        }
        if let Some(end) = self.end {
            end >= self.start && end < total_size
        } else {
            true
        }
    }

    /// Concrete inclusive bounds, or `None` when the range does not fit.
    pub fn resolve(&self, total_size: u64) -> Option<(u64, u64)> {
        if !self.is_valid(total_size) {
            return None;
        }
        Some((self.start, self.end.unwrap_or(total_size - 1)))
    }
}
