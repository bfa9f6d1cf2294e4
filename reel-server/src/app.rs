use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use reel_axum::{NoThumbnails, PlaceholderThumbnails, ThumbnailProvider};
use reel_blob::{BlobAdapter, BlobConfig, BlobStore, FsChunkStore, MemoryChunkStore, DEFAULT_CHUNK_SIZE};
use reel_core::ReelConfig;
use tracing::info;

pub const ENV_PREFIX: &str = "REEL__";

/// Defaults for every key the server reads.
pub fn default_config() -> ReelConfig {
    let mut config = ReelConfig::new();
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3030");
    config.set_default("store.backend", "memory");
    config.set_default("store.root", "./data/blobs");
    config.set_default("store.chunk_size", DEFAULT_CHUNK_SIZE.to_string());
    config.set_default("store.max_blob_bytes", BlobConfig::default().max_blob_bytes.to_string());
    config.set_default("thumbnails.placeholder", "true");
    config
}

/// Defaults overlaid with `REEL__*` environment variables.
pub fn load_config() -> ReelConfig {
    let mut config = default_config();
    config.load_env(ENV_PREFIX);
    config
}

fn required<T>(config: &ReelConfig, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = config
        .get(key)
        .with_context(|| format!("missing config key `{key}`"))?;
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid `{key}` value {raw:?}: {e}"))
}

pub fn listen_addr(config: &ReelConfig) -> Result<String> {
    let host = config.get("http.host").unwrap_or("127.0.0.1");
    let port: u16 = required(config, "http.port")?;
    Ok(format!("{host}:{port}"))
}

pub async fn blob_store(config: &ReelConfig) -> Result<Arc<dyn BlobStore>> {
    let blob_config = BlobConfig::new()
        .with_chunk_size(required(config, "store.chunk_size")?)
        .with_max_blob_bytes(required(config, "store.max_blob_bytes")?);

    let backend = config.get("store.backend").unwrap_or("memory");
    let store = match backend {
        "memory" => BlobAdapter::new(MemoryChunkStore::new(), blob_config)?,
        "fs" => {
            let root = config.get("store.root").unwrap_or("./data/blobs");
            let chunks = FsChunkStore::open(root)
                .await
                .with_context(|| format!("opening blob root {root}"))?;
            BlobAdapter::new(chunks, blob_config)?
        }
        other => bail!("unknown store.backend `{other}` (expected `memory` or `fs`)"),
    };

    info!(
        backend = store.capabilities().name,
        chunk_size = store.config().chunk_size,
        "blob store ready"
    );
    Ok(Arc::new(store))
}

pub fn thumbnails(config: &ReelConfig) -> Result<Arc<dyn ThumbnailProvider>> {
    let provider: Arc<dyn ThumbnailProvider> = if required::<bool>(config, "thumbnails.placeholder")? {
        Arc::new(PlaceholderThumbnails)
    } else {
        Arc::new(NoThumbnails)
    };
    Ok(provider)
}
