//! reel-axum: range-aware media streaming over axum.
//!
//! Serves stored videos and thumbnails with `200`/`206`/`416` framing on
//! top of any [`reel_blob::BlobStore`], plus the upload, edit, thumbnail
//! and delete routes that keep catalog records and blobs in step.

pub mod app;
pub mod catalog;
mod error;
pub mod library;
pub mod media;
pub mod params;
pub mod range;
pub mod rest;
pub mod state;
pub mod stream;
pub mod thumbnail;

pub use error::{blob_error, ReelAxumError};
pub use state::GatewayState;

pub use app::{reel, ReelApp};
pub use catalog::{MediaCatalog, MediaMetadata, MediaRecord, MediaUpdate, MemoryCatalog};
pub use library::{MediaLibrary, NewMedia};
pub use range::{IgnoredRange, RangeDecision, RangeRequest};
pub use stream::StreamSession;
pub use thumbnail::{NoThumbnails, PlaceholderThumbnails, Thumbnail, ThumbnailProvider};
