use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reel_blob::BlobError;
use reel_core::errors::ReelError;
use tracing::error;

#[derive(Debug)]
pub struct ReelAxumError(pub anyhow::Error);

impl From<anyhow::Error> for ReelAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<ReelError> for ReelAxumError {
    fn from(e: ReelError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<axum::http::Error> for ReelAxumError {
    fn from(e: axum::http::Error) -> Self {
        Self(anyhow::Error::new(e))
    }
}

impl IntoResponse for ReelAxumError {
    fn into_response(self) -> Response {
        // A ReelError anywhere in the chain keeps its status and shape
        let safe = match ReelError::from_anyhow(&self.0) {
            Some(reel) => reel.sanitize_for_client(),
            None => {
                error!(error = ?self.0, "unhandled error");
                ReelError::general_error(self.0.to_string())
            }
        };
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}

/// Translate a store failure into the client-facing taxonomy.
///
/// `not_found` is the message used when the blob is absent, so callers can
/// tell "record missing" from "file missing" apart in the response body.
pub fn blob_error(err: BlobError, not_found: &str) -> ReelError {
    match err {
        BlobError::NotFound { .. } => ReelError::not_found(not_found),
        BlobError::Invalid { message } => ReelError::bad_request(message),
        BlobError::TooLarge { .. } => ReelError::payload_too_large(err.to_string()),
        other => {
            error!(error = %other, "blob store failure");
            ReelError::general_error("Storage failure").with_source(anyhow::Error::new(other))
        }
    }
}
