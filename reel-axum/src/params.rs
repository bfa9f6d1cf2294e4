use axum::http::{header, HeaderMap};
use serde::Deserialize;

use crate::library::NewMedia;

/// Query string of `POST /media`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadParams {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    /// Comma separated.
    pub tags: Option<String>,
    pub filename: Option<String>,
}

impl UploadParams {
    pub fn tags(&self) -> Vec<String> {
        self.tags.as_deref().map(split_tags).unwrap_or_default()
    }

    pub fn into_new_media(self, headers: &HeaderMap) -> NewMedia {
        let tags = self.tags();
        NewMedia {
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category.trim().to_string(),
            tags,
            content_type: content_type(headers),
            filename: self.filename,
        }
    }
}

/// `"a, b,,c"` becomes `["a", "b", "c"]`.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
