//! Service wiring

use reelhouse_core::Config;
use reelhouse_db::VideoRepository;
use reelhouse_processing::{
    IngestSettings, ProcessRunner, ThumbnailService, UploadPolicy, VideoIngestService,
};
use reelhouse_storage::Storage;
use std::sync::Arc;

use crate::auth::JwtVerifier;
use crate::state::AppState;

/// Build the shared state from already opened collaborators.
pub fn build_state(
    config: Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
    runner: Arc<dyn ProcessRunner>,
) -> Arc<AppState> {
    let ingest = VideoIngestService::new(
        videos.clone(),
        storage.clone(),
        runner,
        IngestSettings::from_config(&config),
    );
    let thumbnails = ThumbnailService::new(
        videos.clone(),
        assets,
        UploadPolicy::thumbnail(config.max_thumbnail_size_bytes()),
    );

    Arc::new(AppState {
        jwt: JwtVerifier::new(config.jwt_secret()),
        config,
        videos,
        storage,
        ingest,
        thumbnails,
    })
}
