use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Method},
    response::Response,
    routing, Json, Router,
};
use bytes::Bytes;
use futures::TryStreamExt;
use reel_blob::ByteStream;
use reel_core::errors::ReelError;
use serde_json::{json, Value};

use crate::{
    catalog::MediaUpdate,
    media::{self, MediaSlot},
    params::{self, UploadParams},
    GatewayState, ReelAxumError,
};

/// Request body as a store-ready byte stream.
fn body_stream(body: Body) -> ByteStream {
    Box::pin(body.into_data_stream().map_err(std::io::Error::other))
}

async fn stream_video(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ReelAxumError> {
    media::serve(&state, MediaSlot::Video, &id, &method, &headers).await
}

async fn stream_thumbnail(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ReelAxumError> {
    media::serve(&state, MediaSlot::Thumbnail, &id, &method, &headers).await
}

async fn upload(
    State(state): State<GatewayState>,
    Query(query): Query<UploadParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>, ReelAxumError> {
    let media = query.into_new_media(&headers);
    let record = state.library.upload(media, body_stream(body)).await?;
    Ok(Json(json!({
        "message": "Video uploaded successfully",
        "mediaId": record.id,
        "media": record,
    })))
}

/// JSON body with any of `title`, `description`, `category`, `tags`.
async fn update_media(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ReelAxumError> {
    let changes: MediaUpdate = serde_json::from_slice(&body)
        .map_err(|err| ReelError::bad_request(format!("Invalid update body: {err}")))?;
    let record = state.library.update(&id, changes).await?;
    Ok(Json(json!({
        "message": "Video updated successfully",
        "media": record,
    })))
}

async fn replace_thumbnail(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>, ReelAxumError> {
    let thumbnail = state
        .library
        .replace_thumbnail(&id, params::content_type(&headers), body_stream(body))
        .await?;
    Ok(Json(json!({
        "message": "Thumbnail updated successfully",
        "thumbnailId": thumbnail,
    })))
}

async fn delete_media(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ReelAxumError> {
    state.library.delete(&id).await?;
    Ok(Json(json!({ "message": "Video deleted successfully" })))
}

async fn record_view(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ReelAxumError> {
    let views = state.library.record_view(&id).await?;
    Ok(Json(json!({ "message": "View count updated", "views": views })))
}

/// All media routes, rooted at `/media`.
pub fn media_router(state: GatewayState) -> Router<()> {
    Router::new()
        .route("/media", routing::post(upload))
        .route(
            "/media/{id}",
            routing::get(stream_video).put(update_media).delete(delete_media),
        )
        .route(
            "/media/{id}/thumbnail",
            routing::get(stream_thumbnail).put(replace_thumbnail),
        )
        .route("/media/{id}/view", routing::post(record_view))
        .with_state(state)
}
