use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::{BlobError, BlobId, BlobResult, ChunkStore, ObjectManifest, StoreCapabilities};

const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_TMP_FILE: &str = "manifest.json.tmp";

/// Filesystem chunk store.
///
/// Layout: `<root>/<id>/manifest.json` and `<root>/<id>/<n:08>.chunk`.
/// The manifest is written to a temporary file and renamed into place, so
/// an object becomes visible in one step.
#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
}

impl FsChunkStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open<P: Into<PathBuf>>(root: P) -> BlobResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened filesystem chunk store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_dir(&self, id: &BlobId) -> Option<PathBuf> {
        id.is_path_safe().then(|| self.root.join(id.as_str()))
    }

    fn writable_dir(&self, id: &BlobId) -> BlobResult<PathBuf> {
        self.object_dir(id)
            .ok_or_else(|| BlobError::invalid(format!("blob id {id:?} is not a valid object name")))
    }

    fn chunk_file(dir: &Path, n: u32) -> PathBuf {
        dir.join(format!("{n:08}.chunk"))
    }
}

#[async_trait]
impl ChunkStore for FsChunkStore {
    async fn put_chunk(&self, id: &BlobId, n: u32, data: Bytes) -> BlobResult<()> {
        let dir = self.writable_dir(id)?;
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(Self::chunk_file(&dir, n), &data).await?;
        Ok(())
    }

    async fn get_chunk(&self, id: &BlobId, n: u32) -> BlobResult<Bytes> {
        let dir = self.object_dir(id).ok_or_else(|| BlobError::not_found(id.as_str()))?;
        let data = tokio::fs::read(Self::chunk_file(&dir, n))
            .await
            .map_err(|e| BlobError::from_io_for(format!("{id} chunk {n}"), e))?;
        Ok(Bytes::from(data))
    }

    async fn put_manifest(&self, manifest: &ObjectManifest) -> BlobResult<()> {
        let dir = self.writable_dir(&manifest.id)?;
        tokio::fs::create_dir_all(&dir).await?;

        let encoded = serde_json::to_vec(manifest)?;
        let tmp = dir.join(MANIFEST_TMP_FILE);
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, dir.join(MANIFEST_FILE)).await?;
        Ok(())
    }

    async fn get_manifest(&self, id: &BlobId) -> BlobResult<ObjectManifest> {
        let dir = self.object_dir(id).ok_or_else(|| BlobError::not_found(id.as_str()))?;
        let raw = tokio::fs::read(dir.join(MANIFEST_FILE))
            .await
            .map_err(|e| BlobError::from_io_for(id.as_str(), e))?;

        let manifest: ObjectManifest = serde_json::from_slice(&raw)
            .map_err(|e| BlobError::corrupt(id.as_str(), format!("unreadable manifest: {e}")))?;

        if manifest.id != *id || !manifest.is_consistent() {
            return Err(BlobError::corrupt(id.as_str(), "manifest does not describe this object"));
        }
        Ok(manifest)
    }

    async fn delete(&self, id: &BlobId) -> BlobResult<()> {
        let Some(dir) = self.object_dir(id) else {
            return Ok(());
        };

        // Unpublish first so readers stop finding the object.
        match tokio::fs::remove_file(dir.join(MANIFEST_FILE)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::filesystem()
    }
}
