use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::{
    BlobConfig, BlobError, BlobId, BlobPut, BlobResult, ByteStream, ChunkStore, ObjectManifest,
    StoredObject,
};

/// Write side of a blob store.
///
/// The object is invisible until `finish` succeeds. A sink that is aborted,
/// or dropped without finishing, leaves no visible object behind.
#[async_trait]
pub trait BlobSink: Send {
    /// Identifier the object will be published under
    fn id(&self) -> &BlobId;

    /// Bytes accepted so far
    fn bytes_written(&self) -> u64;

    /// Append bytes
    async fn write(&mut self, data: Bytes) -> BlobResult<()>;

    /// Append a whole stream, returning the running total
    async fn write_all(&mut self, mut stream: ByteStream) -> BlobResult<u64> {
        while let Some(chunk) = stream.next().await {
            self.write(chunk?).await?;
        }
        Ok(self.bytes_written())
    }

    /// Publish the object
    async fn finish(self: Box<Self>) -> BlobResult<StoredObject>;

    /// Discard everything written so far
    async fn abort(self: Box<Self>) -> BlobResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Open,
    Finished,
    Aborted,
}

/// Sink that splits incoming bytes into fixed-size chunks.
///
/// Holds at most one chunk of buffered data.
pub struct ChunkedSink {
    chunks: Arc<dyn ChunkStore>,
    id: BlobId,
    put: BlobPut,
    chunk_size: usize,
    max_blob_bytes: u64,
    buffer: BytesMut,
    next_chunk: u32,
    written: u64,
    state: SinkState,
}

impl ChunkedSink {
    pub fn new(chunks: Arc<dyn ChunkStore>, config: &BlobConfig, put: BlobPut) -> Self {
        Self {
            chunks,
            id: BlobId::new(),
            put,
            chunk_size: config.chunk_size as usize,
            max_blob_bytes: config.max_blob_bytes,
            buffer: BytesMut::new(),
            next_chunk: 0,
            written: 0,
            state: SinkState::Open,
        }
    }

    async fn flush_chunk(&mut self, chunk: Bytes) -> BlobResult<()> {
        self.chunks.put_chunk(&self.id, self.next_chunk, chunk).await?;
        self.next_chunk += 1;
        Ok(())
    }

    fn ensure_open(&self) -> BlobResult<()> {
        match self.state {
            SinkState::Open => Ok(()),
            SinkState::Finished => Err(BlobError::invalid("sink already finished")),
            SinkState::Aborted => Err(BlobError::invalid("sink was aborted")),
        }
    }
}

#[async_trait]
impl BlobSink for ChunkedSink {
    fn id(&self) -> &BlobId {
        &self.id
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    async fn write(&mut self, data: Bytes) -> BlobResult<()> {
        self.ensure_open()?;

        let total = self.written + data.len() as u64;
        if total > self.max_blob_bytes {
            return Err(BlobError::TooLarge {
                size: total,
                limit: self.max_blob_bytes,
            });
        }
        self.written = total;

        self.buffer.extend_from_slice(&data);
        while self.buffer.len() >= self.chunk_size {
            let chunk = self.buffer.split_to(self.chunk_size).freeze();
            self.flush_chunk(chunk).await?;
        }
        Ok(())
    }

    async fn finish(self: Box<Self>) -> BlobResult<StoredObject> {
        let mut this = self;
        this.ensure_open()?;

        if !this.buffer.is_empty() {
            let tail = this.buffer.split().freeze();
            this.flush_chunk(tail).await?;
        }

        let manifest = ObjectManifest {
            id: this.id.clone(),
            length: this.written,
            chunk_size: this.chunk_size as u64,
            chunk_count: this.next_chunk,
            content_type: this.put.content_type.clone(),
            filename: this.put.filename.clone(),
            created_at: chrono::Utc::now().timestamp(),
        };
        if !manifest.is_consistent() {
            return Err(BlobError::corrupt(
                this.id.as_str(),
                format!("{} chunks written for {} bytes", manifest.chunk_count, manifest.length),
            ));
        }

        this.chunks.put_manifest(&manifest).await?;
        this.state = SinkState::Finished;

        debug!(blob = %this.id, length = manifest.length, chunks = manifest.chunk_count, "blob published");
        Ok(StoredObject::from_manifest(&manifest))
    }

    async fn abort(self: Box<Self>) -> BlobResult<()> {
        let mut this = self;
        this.ensure_open()?;
        this.state = SinkState::Aborted;
        this.buffer.clear();
        this.chunks.delete(&this.id).await
    }
}

impl Drop for ChunkedSink {
    fn drop(&mut self) {
        if self.state != SinkState::Open || self.next_chunk == 0 {
            return;
        }

        // Unfinished: remove the staged chunks in the background.
        let chunks = Arc::clone(&self.chunks);
        let id = self.id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = chunks.delete(&id).await {
                        warn!(blob = %id, error = %err, "failed to clean up unfinished blob");
                    }
                });
            }
            Err(_) => {
                warn!(blob = %id, "unfinished blob dropped outside a runtime; staged chunks left behind");
            }
        }
    }
}
