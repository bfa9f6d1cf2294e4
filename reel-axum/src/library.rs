use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use reel_blob::{BlobId, BlobPut, BlobStore, ByteStream, StoredObject};
use reel_core::errors::ReelError;
use reel_core::{bail_reel, ReelResult};
use tracing::{debug, info, instrument, warn};

use crate::catalog::{MediaCatalog, MediaMetadata, MediaRecord, MediaUpdate};
use crate::error::blob_error;
use crate::thumbnail::{Thumbnail, ThumbnailProvider};

/// Fields of a video being uploaded.
#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// Lifecycle of media records and the blobs they own.
///
/// Keeps the two in step: blobs are written before the record points at
/// them and deleted before the record goes away.
pub struct MediaLibrary {
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn MediaCatalog>,
    thumbnails: Arc<dyn ThumbnailProvider>,
}

impl MediaLibrary {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn MediaCatalog>,
        thumbnails: Arc<dyn ThumbnailProvider>,
    ) -> Self {
        Self { blobs, catalog, thumbnails }
    }

    /// Store the body as a new video and catalogue it.
    #[instrument(skip_all, fields(title = %media.title))]
    pub async fn upload(&self, media: NewMedia, body: ByteStream) -> ReelResult<MediaRecord> {
        if media.title.trim().is_empty() || media.category.trim().is_empty() {
            bail_reel!(bad_request, "Title and category are required");
        }

        let mut put = BlobPut::new();
        if let Some(ct) = &media.content_type {
            put = put.with_content_type(ct.clone());
        }
        if let Some(name) = &media.filename {
            put = put.with_filename(name.clone());
        }
        let video = self.store_stream(put, body, "No video file provided").await?;

        let mut record = MediaRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title: media.title,
            description: media.description,
            category: media.category,
            duration: 0,
            file_id: video.id.clone(),
            thumbnail_id: None,
            upload_date: Utc::now(),
            views: 0,
            tags: media.tags,
            metadata: MediaMetadata::for_upload(video.length, video.content_type.as_deref()),
            is_active: true,
        };

        match self.thumbnails.generate(&record).await {
            Ok(Some(thumbnail)) => match self.store_thumbnail(thumbnail).await {
                Ok(stored) => record.thumbnail_id = Some(stored.id),
                Err(err) => warn!(error = %err, "thumbnail could not be stored; continuing without"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "thumbnail generation failed; continuing without"),
        }

        match self.catalog.insert(record.clone()).await {
            Ok(record) => {
                info!(media = %record.id, blob = %record.file_id, bytes = video.length, "video uploaded");
                Ok(record)
            }
            Err(err) => {
                self.discard(&record.file_id).await;
                if let Some(thumb) = &record.thumbnail_id {
                    self.discard(thumb).await;
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, record_id: &str, changes: MediaUpdate) -> ReelResult<MediaRecord> {
        let record = self.catalog.update(record_id, changes).await?;
        info!(media = record_id, "video details updated");
        Ok(record)
    }

    /// Swap the record's thumbnail for the body, returning the new blob id.
    ///
    /// The old blob is removed before the new one is attached. A thumbnail
    /// attached by an overlapping replacement in the meantime is removed too.
    #[instrument(skip(self, body))]
    pub async fn replace_thumbnail(
        &self,
        record_id: &str,
        content_type: Option<String>,
        body: ByteStream,
    ) -> ReelResult<BlobId> {
        let record = self.catalog.get(record_id).await?;

        let mut put = BlobPut::new();
        if let Some(ct) = content_type {
            put = put.with_content_type(ct);
        }
        let stored = self.store_stream(put, body, "No thumbnail file provided").await?;

        if let Some(old) = &record.thumbnail_id {
            self.discard(old).await;
        }

        let previous = match self.catalog.set_thumbnail(record_id, Some(stored.id.clone())).await {
            Ok(previous) => previous,
            Err(err) => {
                self.discard(&stored.id).await;
                return Err(err);
            }
        };
        if let Some(previous) = previous {
            if Some(&previous) != record.thumbnail_id.as_ref() && previous != stored.id {
                debug!(blob = %previous, "dropping thumbnail attached by an overlapping replacement");
                self.discard(&previous).await;
            }
        }
        info!(media = record_id, blob = %stored.id, "thumbnail replaced");
        Ok(stored.id)
    }

    /// Remove a record and both of its blobs.
    ///
    /// A blob that is already gone does not stop the record from being removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, record_id: &str) -> ReelResult<MediaRecord> {
        let record = self.catalog.get(record_id).await?;

        self.discard(&record.file_id).await;
        if let Some(thumb) = &record.thumbnail_id {
            self.discard(thumb).await;
        }

        let removed = self.catalog.remove(record_id).await?;
        info!(media = record_id, "video deleted");
        Ok(removed)
    }

    pub async fn record_view(&self, record_id: &str) -> ReelResult<u64> {
        self.catalog.increment_views(record_id).await
    }

    async fn store_thumbnail(&self, thumbnail: Thumbnail) -> ReelResult<StoredObject> {
        let put = BlobPut::new()
            .with_content_type(thumbnail.content_type)
            .with_size_hint(thumbnail.bytes.len() as u64);
        let body: ByteStream = Box::pin(futures::stream::once(async move {
            Ok::<Bytes, std::io::Error>(thumbnail.bytes)
        }));
        self.store_stream(put, body, "Empty thumbnail").await
    }

    /// Pour `body` into a new blob; nothing is published unless every byte
    /// landed and there was at least one.
    async fn store_stream(&self, put: BlobPut, body: ByteStream, empty: &str) -> ReelResult<StoredObject> {
        let mut sink = self
            .blobs
            .open_write(put)
            .await
            .map_err(|e| blob_error(e, "Blob not found").into_anyhow())?;

        if let Err(err) = sink.write_all(body).await {
            let written = sink.bytes_written();
            if let Err(abort_err) = sink.abort().await {
                warn!(error = %abort_err, "failed to discard partial upload");
            }
            debug!(written, error = %err, "upload aborted");
            return Err(blob_error(err, "Blob not found").into_anyhow());
        }

        if sink.bytes_written() == 0 {
            if let Err(abort_err) = sink.abort().await {
                warn!(error = %abort_err, "failed to discard empty upload");
            }
            return Err(ReelError::bad_request(empty).into_anyhow());
        }

        sink.finish()
            .await
            .map_err(|e| blob_error(e, "Blob not found").into_anyhow())
    }

    /// Best-effort blob removal for cleanup paths.
    async fn discard(&self, id: &BlobId) {
        if let Err(err) = self.blobs.delete(id).await {
            warn!(blob = %id, error = %err, "blob cleanup failed; continuing");
        }
    }
}
