use std::sync::Arc;

use bandstand_application::{
    AlbumService, BandService, DocumentStore, LocalizationService, RequestPipeline, SongService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub band_service: BandService,
    pub album_service: AlbumService,
    pub song_service: SongService,
    pub localization: LocalizationService,
}

impl AppState {
    /// Wires the catalog services over one storage backend.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        query_max_limit: usize,
        localization: LocalizationService,
    ) -> Self {
        let pipeline = RequestPipeline::new(store, query_max_limit);

        Self {
            band_service: BandService::new(pipeline.clone()),
            album_service: AlbumService::new(pipeline.clone()),
            song_service: SongService::new(pipeline),
            localization,
        }
    }
}
