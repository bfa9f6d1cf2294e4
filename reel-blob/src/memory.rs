use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{BlobError, BlobId, BlobResult, ChunkStore, ObjectManifest, StoreCapabilities};

#[derive(Default)]
struct ObjectEntry {
    manifest: Option<ObjectManifest>,
    chunks: BTreeMap<u32, Bytes>,
}

/// In-memory chunk store for tests and development
#[derive(Clone, Default)]
pub struct MemoryChunkStore {
    objects: Arc<RwLock<HashMap<BlobId, ObjectEntry>>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects with any state (published or staged).
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// Number of chunks held for an object, published or not.
    pub fn chunk_count(&self, id: &BlobId) -> usize {
        self.objects
            .read()
            .get(id)
            .map(|entry| entry.chunks.len())
            .unwrap_or(0)
    }

    /// Drop a single chunk, leaving the manifest in place.
    pub fn remove_chunk(&self, id: &BlobId, n: u32) -> Option<Bytes> {
        self.objects
            .write()
            .get_mut(id)
            .and_then(|entry| entry.chunks.remove(&n))
    }

    /// Overwrite a single chunk in place, bypassing the write path.
    pub fn replace_chunk(&self, id: &BlobId, n: u32, data: Bytes) {
        self.objects
            .write()
            .entry(id.clone())
            .or_default()
            .chunks
            .insert(n, data);
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put_chunk(&self, id: &BlobId, n: u32, data: Bytes) -> BlobResult<()> {
        self.objects
            .write()
            .entry(id.clone())
            .or_default()
            .chunks
            .insert(n, data);
        Ok(())
    }

    async fn get_chunk(&self, id: &BlobId, n: u32) -> BlobResult<Bytes> {
        let objects = self.objects.read();
        objects
            .get(id)
            .and_then(|entry| entry.chunks.get(&n))
            .cloned()
            .ok_or_else(|| BlobError::not_found(format!("{id} chunk {n}")))
    }

    async fn put_manifest(&self, manifest: &ObjectManifest) -> BlobResult<()> {
        self.objects
            .write()
            .entry(manifest.id.clone())
            .or_default()
            .manifest = Some(manifest.clone());
        Ok(())
    }

    async fn get_manifest(&self, id: &BlobId) -> BlobResult<ObjectManifest> {
        let objects = self.objects.read();
        objects
            .get(id)
            .and_then(|entry| entry.manifest.clone())
            .ok_or_else(|| BlobError::not_found(id.as_str()))
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        self.objects.write().remove(id);
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::memory()
    }
}
