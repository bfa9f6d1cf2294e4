use serde::{Deserialize, Serialize};

use crate::{BlobId, ObjectManifest};

/// A published blob as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub id: BlobId,
    pub length: u64,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub created_at: i64,
    pub chunk_size: u64,
}

impl StoredObject {
    pub fn from_manifest(manifest: &ObjectManifest) -> Self {
        Self {
            id: manifest.id.clone(),
            length: manifest.length,
            content_type: manifest.content_type.clone(),
            filename: manifest.filename.clone(),
            created_at: manifest.created_at,
            chunk_size: manifest.chunk_size,
        }
    }

    /// Stored content type, or `fallback` when none was recorded.
    pub fn content_type_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// Concrete inclusive byte window over an object of `total_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn new(start: u64, end: u64, total_size: u64) -> Self {
        debug_assert!(start <= end && end < total_size);
        Self {
            start,
            end,
            total_size,
        }
    }

    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for a `Content-Range` header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }

    pub fn as_byte_range(&self) -> crate::ByteRange {
        crate::ByteRange::bounded(self.start, self.end)
    }
}
