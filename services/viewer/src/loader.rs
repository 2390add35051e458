//! Raster byte sources.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use overlay_common::{OverlayError, OverlayResult, Raster};

/// Fetches the bytes behind a manifest path.
#[async_trait]
pub trait RasterLoader: Send + Sync {
    async fn fetch(&self, path: &str) -> OverlayResult<Vec<u8>>;
}

/// Reads manifest paths relative to a local data directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RasterLoader for FsLoader {
    async fn fetch(&self, path: &str) -> OverlayResult<Vec<u8>> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "Reading raster file");
        let bytes = tokio::fs::read(&full).await?;
        Ok(bytes)
    }
}

/// Fetch and decode one raster. Decoding runs on the blocking pool.
pub async fn load_raster(loader: &dyn RasterLoader, path: &str) -> OverlayResult<Raster> {
    let bytes = loader.fetch(path).await?;
    let raster = tokio::task::spawn_blocking(move || raster_decoder::decode(&bytes))
        .await
        .map_err(|e| OverlayError::Decode(format!("decode task failed: {}", e)))??;
    Ok(raster)
}
