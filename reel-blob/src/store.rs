use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{BlobId, BlobResult};

/// Chunk-level storage primitives - must be implemented by all storage backends.
///
/// An object is a manifest plus `chunk_count` numbered chunks. Backends keep
/// no knowledge of byte ranges; that arithmetic lives in `BlobAdapter`.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store chunk `n` of an object. Chunks of an unpublished object are
    /// invisible to readers.
    async fn put_chunk(&self, id: &BlobId, n: u32, data: Bytes) -> BlobResult<()>;

    /// Fetch chunk `n`. Fails with `NotFound` if the chunk is missing.
    async fn get_chunk(&self, id: &BlobId, n: u32) -> BlobResult<Bytes>;

    /// Publish an object. Must be atomic: readers see the old state or the
    /// full manifest, never a partial one.
    async fn put_manifest(&self, manifest: &ObjectManifest) -> BlobResult<()>;

    /// Fetch the manifest. Fails with `NotFound` if the object is not published.
    async fn get_manifest(&self, id: &BlobId) -> BlobResult<ObjectManifest>;

    /// Remove the manifest and every chunk of an object. Missing objects are
    /// not an error.
    async fn delete(&self, id: &BlobId) -> BlobResult<()>;

    /// Get store capabilities
    fn capabilities(&self) -> StoreCapabilities;
}

/// Published description of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectManifest {
    pub id: BlobId,
    pub length: u64,
    pub chunk_size: u64,
    pub chunk_count: u32,
    pub content_type: Option<String>,
    pub filename: Option<String>,
    pub created_at: i64,
}

impl ObjectManifest {
    /// Number of chunks needed for `length` bytes.
    pub fn chunks_for(length: u64, chunk_size: u64) -> u32 {
        if length == 0 {
            0
        } else {
            ((length - 1) / chunk_size + 1) as u32
        }
    }

    /// Byte offset at which chunk `n` starts.
    pub fn chunk_offset(&self, n: u32) -> u64 {
        n as u64 * self.chunk_size
    }

    /// Exact size chunk `n` must have.
    pub fn expected_chunk_len(&self, n: u32) -> u64 {
        let offset = self.chunk_offset(n);
        self.length.saturating_sub(offset).min(self.chunk_size)
    }

    /// Index of the chunk holding byte `offset`.
    pub fn chunk_index(&self, offset: u64) -> u32 {
        (offset / self.chunk_size) as u32
    }

    /// Structural consistency check, run whenever a manifest is loaded.
    pub fn is_consistent(&self) -> bool {
        self.chunk_size > 0 && Self::chunks_for(self.length, self.chunk_size) == self.chunk_count
    }
}

/// Store capabilities
#[derive(Debug, Clone, Default)]
pub struct StoreCapabilities {
    pub name: &'static str,
    pub durable: bool,
}

impl StoreCapabilities {
    pub fn memory() -> Self {
        Self {
            name: "memory",
            durable: false,
        }
    }

    pub fn filesystem() -> Self {
        Self {
            name: "fs",
            durable: true,
        }
    }
}
