use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reel_blob::BlobId;
use reel_core::errors::ReelError;
use reel_core::ReelResult;
use serde::{Deserialize, Serialize};

use crate::params::split_tags;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub resolution: String,
    pub file_size: u64,
    pub format: String,
    pub codec: String,
}

impl MediaMetadata {
    /// Defaults for a fresh upload; the format is the MIME subtype when known.
    pub fn for_upload(file_size: u64, content_type: Option<&str>) -> Self {
        let format = content_type
            .and_then(|ct| ct.split(';').next())
            .and_then(|ct| ct.split_once('/'))
            .map(|(_, subtype)| subtype.trim())
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("mp4");
        Self {
            resolution: "720p".to_string(),
            file_size,
            format: format.to_string(),
            codec: "H.264".to_string(),
        }
    }
}

/// A catalogued video and the blobs it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Seconds; 0 when unknown.
    pub duration: u64,
    pub file_id: BlobId,
    pub thumbnail_id: Option<BlobId>,
    pub upload_date: DateTime<Utc>,
    pub views: u64,
    pub tags: Vec<String>,
    pub metadata: MediaMetadata,
    pub is_active: bool,
}

/// Changes to a record's descriptive fields.
///
/// Missing or blank fields leave the record untouched; `tags` is a comma
/// separated list that replaces the current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

impl MediaUpdate {
    pub fn apply(self, record: &mut MediaRecord) {
        let given = |field: Option<String>| field.filter(|v| !v.trim().is_empty());

        if let Some(title) = given(self.title) {
            record.title = title.trim().to_string();
        }
        if let Some(description) = given(self.description) {
            record.description = description;
        }
        if let Some(category) = given(self.category) {
            record.category = category.trim().to_string();
        }
        if let Some(tags) = given(self.tags) {
            record.tags = split_tags(&tags);
        }
    }
}

/// Record lookup and the few mutations the gateway performs.
///
/// Listing, search and aggregation live elsewhere.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn get(&self, record_id: &str) -> ReelResult<MediaRecord>;

    async fn insert(&self, record: MediaRecord) -> ReelResult<MediaRecord>;

    /// Returns the record as stored after the change.
    async fn update(&self, record_id: &str, changes: MediaUpdate) -> ReelResult<MediaRecord>;

    /// Point the thumbnail slot at `thumbnail`, returning the previous value.
    async fn set_thumbnail(&self, record_id: &str, thumbnail: Option<BlobId>) -> ReelResult<Option<BlobId>>;

    async fn remove(&self, record_id: &str) -> ReelResult<MediaRecord>;

    /// Returns the new view count.
    async fn increment_views(&self, record_id: &str) -> ReelResult<u64>;

    async fn resolve_media_object_id(&self, record_id: &str) -> ReelResult<BlobId> {
        Ok(self.get(record_id).await?.file_id)
    }

    async fn resolve_thumbnail_object_id(&self, record_id: &str) -> ReelResult<BlobId> {
        self.get(record_id)
            .await?
            .thumbnail_id
            .ok_or_else(|| ReelError::not_found("No thumbnail available").into_anyhow())
    }
}

/// In-process catalog.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    records: Arc<RwLock<HashMap<String, MediaRecord>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn missing(record_id: &str) -> anyhow::Error {
    ReelError::not_found(format!("Video '{record_id}' not found")).into_anyhow()
}

#[async_trait]
impl MediaCatalog for MemoryCatalog {
    async fn get(&self, record_id: &str) -> ReelResult<MediaRecord> {
        self.records
            .read()
            .get(record_id)
            .cloned()
            .ok_or_else(|| missing(record_id))
    }

    async fn insert(&self, record: MediaRecord) -> ReelResult<MediaRecord> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(ReelError::conflict(format!("Video '{}' already exists", record.id)).into_anyhow());
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, record_id: &str, changes: MediaUpdate) -> ReelResult<MediaRecord> {
        let mut records = self.records.write();
        let record = records.get_mut(record_id).ok_or_else(|| missing(record_id))?;
        changes.apply(record);
        Ok(record.clone())
    }

    async fn set_thumbnail(&self, record_id: &str, thumbnail: Option<BlobId>) -> ReelResult<Option<BlobId>> {
        let mut records = self.records.write();
        let record = records.get_mut(record_id).ok_or_else(|| missing(record_id))?;
        Ok(std::mem::replace(&mut record.thumbnail_id, thumbnail))
    }

    async fn remove(&self, record_id: &str) -> ReelResult<MediaRecord> {
        self.records
            .write()
            .remove(record_id)
            .ok_or_else(|| missing(record_id))
    }

    async fn increment_views(&self, record_id: &str) -> ReelResult<u64> {
        let mut records = self.records.write();
        let record = records.get_mut(record_id).ok_or_else(|| missing(record_id))?;
        record.views += 1;
        Ok(record.views)
    }
}
