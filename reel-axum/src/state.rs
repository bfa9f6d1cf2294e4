use std::sync::Arc;

use reel_blob::BlobStore;

use crate::catalog::MediaCatalog;
use crate::library::MediaLibrary;
use crate::thumbnail::{NoThumbnails, ThumbnailProvider};

/// Shared handles every route needs. Cheap to clone.
#[derive(Clone)]
pub struct GatewayState {
    pub blobs: Arc<dyn BlobStore>,
    pub catalog: Arc<dyn MediaCatalog>,
    pub library: Arc<MediaLibrary>,
}

impl GatewayState {
    pub fn new(blobs: Arc<dyn BlobStore>, catalog: Arc<dyn MediaCatalog>) -> Self {
        Self::with_thumbnails(blobs, catalog, Arc::new(NoThumbnails))
    }

    pub fn with_thumbnails(
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn MediaCatalog>,
        thumbnails: Arc<dyn ThumbnailProvider>,
    ) -> Self {
        let library = Arc::new(MediaLibrary::new(
            Arc::clone(&blobs),
            Arc::clone(&catalog),
            thumbnails,
        ));
        Self { blobs, catalog, library }
    }
}
