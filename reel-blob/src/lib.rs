//! # reel-blob: chunked blob storage with range-addressable reads
//!
//! Objects are stored as a manifest plus fixed-size chunks. Readers ask for
//! an inclusive byte window and get a lazy stream that fetches one chunk per
//! poll, so a multi-gigabyte video never sits in memory and a slow consumer
//! simply stops the store from being read.
//!
//! ```text
//! ┌─────────────────┐
//! │   Gateway       │  ← HTTP framing, range policy
//! ├─────────────────┤
//! │   BlobStore     │  ← length / open_read / open_write / delete
//! ├─────────────────┤
//! │   ChunkStore    │  ← manifest + numbered chunks (memory, fs)
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use reel_blob::prelude::*;
//! use bytes::Bytes;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let config = BlobConfig::default().with_chunk_size(4);
//! let store = BlobAdapter::new(MemoryChunkStore::new(), config)?;
//!
//! let mut sink = store.open_write(BlobPut::new().with_content_type("text/plain")).await?;
//! sink.write(Bytes::from_static(b"hello, chunks")).await?;
//! let object = sink.finish().await?;
//!
//! assert_eq!(store.length(&object.id).await?, 13);
//! let _window = store.open_read(&object.id, Some(ByteRange::bounded(7, 12))).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod error;
pub mod fs;
pub mod memory;
mod receipt;
mod sink;
pub mod store;
mod types;

pub use adapter::{BlobAdapter, BlobStore};
pub use config::{BlobConfig, DEFAULT_CHUNK_SIZE};
pub use error::{BlobError, BlobResult};
pub use fs::FsChunkStore;
pub use memory::MemoryChunkStore;
pub use receipt::{ResolvedRange, StoredObject};
pub use sink::{BlobSink, ChunkedSink};
pub use store::{ChunkStore, ObjectManifest, StoreCapabilities};
pub use types::{BlobId, BlobPut, ByteRange, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobId, BlobPut, BlobResult, BlobSink, BlobStore,
        ByteRange, ByteStream, MemoryChunkStore, StoredObject,
    };
}
