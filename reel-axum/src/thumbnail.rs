use async_trait::async_trait;
use bytes::Bytes;

use crate::catalog::MediaRecord;

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Produces a thumbnail for a freshly uploaded video.
///
/// Failure is never fatal to the upload; the record is simply left without
/// a thumbnail.
#[async_trait]
pub trait ThumbnailProvider: Send + Sync {
    async fn generate(&self, record: &MediaRecord) -> anyhow::Result<Option<Thumbnail>>;
}

pub struct NoThumbnails;

#[async_trait]
impl ThumbnailProvider for NoThumbnails {
    async fn generate(&self, _record: &MediaRecord) -> anyhow::Result<Option<Thumbnail>> {
        Ok(None)
    }
}

/// 320x180 SVG card showing the title and category.
pub struct PlaceholderThumbnails;

impl PlaceholderThumbnails {
    pub fn render(title: &str, category: &str) -> String {
        format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="320" height="180" viewBox="0 0 320 180">"##,
                r##"<rect width="320" height="180" fill="#1f2937"/>"##,
                r##"<polygon points="145,70 145,110 180,90" fill="#f9fafb"/>"##,
                r##"<text x="160" y="140" font-family="sans-serif" font-size="16" fill="#f9fafb" text-anchor="middle">{}</text>"##,
                r##"<text x="160" y="162" font-family="sans-serif" font-size="11" fill="#9ca3af" text-anchor="middle">{}</text>"##,
                "</svg>"
            ),
            escape_xml(&truncate(title, 32)),
            escape_xml(&truncate(category, 40)),
        )
    }
}

#[async_trait]
impl ThumbnailProvider for PlaceholderThumbnails {
    async fn generate(&self, record: &MediaRecord) -> anyhow::Result<Option<Thumbnail>> {
        let svg = Self::render(&record.title, &record.category);
        Ok(Some(Thumbnail {
            bytes: Bytes::from(svg),
            content_type: "image/svg+xml".to_string(),
        }))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars - 1).collect();
    cut.push('…');
    cut
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
