use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::{
    BlobConfig, BlobError, BlobId, BlobPut, BlobResult, BlobSink, ByteRange, ByteStream,
    ChunkStore, ChunkedSink, ObjectManifest, StoreCapabilities, StoredObject,
};

/// Byte-addressable access to stored objects.
///
/// This is the surface the streaming gateway consumes. Chunking, if any, is
/// an implementation detail of the store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Describe a published object. Fails with `NotFound` if absent.
    async fn stat(&self, id: &BlobId) -> BlobResult<StoredObject>;

    /// Total length of a published object.
    async fn length(&self, id: &BlobId) -> BlobResult<u64> {
        Ok(self.stat(id).await?.length)
    }

    /// Open a lazy, forward-only stream over `range` (inclusive), or the
    /// whole object when `range` is `None`.
    ///
    /// Fails up front with `NotFound` when the object or its first backing
    /// chunk is missing and with `Invalid` when the range does not fit.
    /// Faults after that arrive as an `Err` item, after which the stream ends.
    async fn open_read(&self, id: &BlobId, range: Option<ByteRange>) -> BlobResult<ByteStream>;

    /// Start writing a new object under a freshly minted id.
    async fn open_write(&self, put: BlobPut) -> BlobResult<Box<dyn BlobSink>>;

    /// Remove an object. Removing a missing object succeeds.
    async fn delete(&self, id: &BlobId) -> BlobResult<()>;
}

/// `BlobStore` over any chunk-level backend.
#[derive(Clone)]
pub struct BlobAdapter {
    chunks: Arc<dyn ChunkStore>,
    config: BlobConfig,
}

impl BlobAdapter {
    /// Create a new blob adapter
    pub fn new<S: ChunkStore + 'static>(store: S, config: BlobConfig) -> BlobResult<Self> {
        Self::from_arc(Arc::new(store), config)
    }

    /// Create from a shared backend
    pub fn from_arc(chunks: Arc<dyn ChunkStore>, config: BlobConfig) -> BlobResult<Self> {
        config.validate()?;
        Ok(Self { chunks, config })
    }

    /// Get configuration
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn capabilities(&self) -> StoreCapabilities {
        self.chunks.capabilities()
    }
}

/// Fetch chunk `n` and check it has exactly the size the manifest implies.
async fn read_chunk(chunks: &dyn ChunkStore, manifest: &ObjectManifest, n: u32) -> BlobResult<Bytes> {
    let data = chunks.get_chunk(&manifest.id, n).await?;
    let expected = manifest.expected_chunk_len(n);
    if data.len() as u64 != expected {
        return Err(BlobError::corrupt(
            manifest.id.as_str(),
            format!("chunk {} has {} bytes, expected {}", n, data.len(), expected),
        ));
    }
    Ok(data)
}

#[async_trait]
impl BlobStore for BlobAdapter {
    async fn stat(&self, id: &BlobId) -> BlobResult<StoredObject> {
        let manifest = self.chunks.get_manifest(id).await?;
        Ok(StoredObject::from_manifest(&manifest))
    }

    async fn open_read(&self, id: &BlobId, range: Option<ByteRange>) -> BlobResult<ByteStream> {
        let manifest = self.chunks.get_manifest(id).await?;

        let (start, end) = match range {
            None if manifest.length == 0 => return Ok(Box::pin(futures_util::stream::empty())),
            None => (0, manifest.length - 1),
            Some(range) => range.resolve(manifest.length).ok_or_else(|| {
                BlobError::invalid(format!(
                    "range {}-{} is outside object {} of {} bytes",
                    range.start,
                    range.end.map(|e| e.to_string()).unwrap_or_default(),
                    id,
                    manifest.length
                ))
            })?,
        };

        let first = manifest.chunk_index(start);
        let last = manifest.chunk_index(end);

        // The first chunk is read before the stream is handed out so a
        // missing backing file is reported while a status can still change.
        let head = read_chunk(self.chunks.as_ref(), &manifest, first).await?;
        debug!(blob = %id, start, end, first, last, "opened read stream");

        let chunks = Arc::clone(&self.chunks);
        let stream = async_stream::stream! {
            let mut pending = Some(head);
            for n in first..=last {
                let chunk = match pending.take() {
                    Some(chunk) => chunk,
                    None => match read_chunk(chunks.as_ref(), &manifest, n).await {
                        Ok(chunk) => chunk,
                        Err(err) => {
                            warn!(blob = %manifest.id, chunk = n, error = %err, "chunk read failed mid-stream");
                            yield Err(err.into_io());
                            return;
                        }
                    },
                };

                let offset = manifest.chunk_offset(n);
                let lo = (start.max(offset) - offset) as usize;
                let hi = (end.min(offset + chunk.len() as u64 - 1) - offset) as usize;
                yield Ok(chunk.slice(lo..=hi));
            }
        };

        Ok(Box::pin(stream))
    }

    async fn open_write(&self, put: BlobPut) -> BlobResult<Box<dyn BlobSink>> {
        if let Some(size) = put.size_hint {
            if size > self.config.max_blob_bytes {
                return Err(BlobError::TooLarge {
                    size,
                    limit: self.config.max_blob_bytes,
                });
            }
        }

        Ok(Box::new(ChunkedSink::new(Arc::clone(&self.chunks), &self.config, put)))
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        self.chunks.delete(id).await
    }
}
