//! The per-request streaming state machine.
//!
//! Resolve the record to a blob, measure the blob, interpret `Range`, then
//! frame the response and hand the body to a [`StreamSession`]. Everything
//! that can fail with a proper status happens before the headers leave.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::Response;
use reel_blob::BlobId;
use tracing::debug;

use crate::error::{blob_error, ReelAxumError};
use crate::range::{RangeDecision, RangeRequest};
use crate::stream::StreamSession;
use crate::GatewayState;

/// Which blob of a record is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    Video,
    Thumbnail,
}

impl MediaSlot {
    pub fn label(self) -> &'static str {
        match self {
            MediaSlot::Video => "video",
            MediaSlot::Thumbnail => "thumbnail",
        }
    }

    fn default_content_type(self) -> &'static str {
        match self {
            MediaSlot::Video => "video/mp4",
            MediaSlot::Thumbnail => "image/jpeg",
        }
    }

    fn missing_blob(self) -> &'static str {
        match self {
            MediaSlot::Video => "Video file not found",
            MediaSlot::Thumbnail => "Thumbnail not found",
        }
    }
}

async fn resolve(state: &GatewayState, slot: MediaSlot, record_id: &str) -> Result<BlobId, ReelAxumError> {
    let id = match slot {
        MediaSlot::Video => state.catalog.resolve_media_object_id(record_id).await?,
        MediaSlot::Thumbnail => state.catalog.resolve_thumbnail_object_id(record_id).await?,
    };
    Ok(id)
}

/// Serve one slot of one record, honouring a single byte range.
pub async fn serve(
    state: &GatewayState,
    slot: MediaSlot,
    record_id: &str,
    method: &Method,
    headers: &HeaderMap,
) -> Result<Response, ReelAxumError> {
    let blob = resolve(state, slot, record_id).await?;

    let object = state
        .blobs
        .stat(&blob)
        .await
        .map_err(|e| blob_error(e, slot.missing_blob()))?;
    let length = object.length;

    let request = RangeRequest::from_headers(headers);
    let window = match request.resolve(length) {
        RangeDecision::Unsatisfiable => {
            debug!(media = record_id, blob = %blob, length, ?request, "range not satisfiable");
            return unsatisfiable(length);
        }
        RangeDecision::Full => {
            if let RangeRequest::Ignored(reason) = request {
                debug!(media = record_id, ?reason, "range header ignored; serving whole object");
            }
            None
        }
        RangeDecision::Partial(range) => Some(range),
    };

    let content_length = window.map_or(length, |r| r.content_length());
    let mut builder = Response::builder()
        .status(if window.is_some() { StatusCode::PARTIAL_CONTENT } else { StatusCode::OK })
        .header(header::CONTENT_TYPE, object.content_type_or(slot.default_content_type()))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, content_length);
    if let Some(range) = window {
        builder = builder.header(header::CONTENT_RANGE, range.content_range());
    }

    // Opened even for HEAD so a missing backing chunk still reports 404.
    let upstream = state
        .blobs
        .open_read(&blob, window.map(|r| r.as_byte_range()))
        .await
        .map_err(|e| blob_error(e, slot.missing_blob()))?;

    if *method == Method::HEAD {
        drop(upstream);
        return Ok(builder.body(Body::empty())?);
    }

    let session = StreamSession::new(slot.label(), blob, content_length);
    Ok(builder.body(session.into_body(upstream))?)
}

/// 416 with the object length, no body.
fn unsatisfiable(length: u64) -> Result<Response, ReelAxumError> {
    let response = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{length}"))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, 0u64)
        .body(Body::empty())?;
    Ok(response)
}
