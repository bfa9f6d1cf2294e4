use crate::{BlobError, BlobResult};

/// Default chunk size: 255 KiB, small enough that a stream holds little
/// memory and large enough to keep per-chunk overhead low.
pub const DEFAULT_CHUNK_SIZE: u64 = 255 * 1024;

/// Configuration for blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Size of each stored chunk in bytes (the final chunk may be shorter)
    pub chunk_size: u64,

    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_blob_bytes: 5 * 1024 * 1024 * 1024, // 5GB
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set chunk size
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    pub fn validate(&self) -> BlobResult<()> {
        if self.chunk_size == 0 {
            return Err(BlobError::invalid("chunk_size must be greater than zero"));
        }
        if self.chunk_size > u32::MAX as u64 {
            return Err(BlobError::invalid(format!(
                "chunk_size {} is larger than a single chunk may be",
                self.chunk_size
            )));
        }
        // chunk indices are u32
        if self.max_blob_bytes.div_ceil(self.chunk_size) > u64::from(u32::MAX) {
            return Err(BlobError::invalid(format!(
                "chunk_size {} is too small for max_blob_bytes {}",
                self.chunk_size, self.max_blob_bytes
            )));
        }
        Ok(())
    }
}
