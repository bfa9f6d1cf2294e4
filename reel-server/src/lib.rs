pub mod app;

use std::sync::Arc;

use anyhow::Result;
use reel_axum::{GatewayState, MemoryCatalog, ReelApp};
use reel_core::ReelConfig;

pub use app::{default_config, load_config};

/// Assemble the application from configuration.
pub async fn build(config: &ReelConfig) -> Result<ReelApp> {
    let blobs = app::blob_store(config).await?;
    let catalog = Arc::new(MemoryCatalog::new());
    let thumbnails = app::thumbnails(config)?;

    let state = GatewayState::with_thumbnails(blobs, catalog, thumbnails);
    let ax = reel_axum::reel(state).service("/health", || async { "ok" });

    Ok(ax)
}
