//! Application state shared by every handler.

use reelhouse_core::Config;
use reelhouse_db::VideoRepository;
use reelhouse_processing::{ThumbnailService, VideoIngestService};
use reelhouse_storage::Storage;
use std::sync::Arc;

use crate::auth::JwtVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    /// Object store holding processed videos
    pub storage: Arc<dyn Storage>,
    pub ingest: VideoIngestService,
    pub thumbnails: ThumbnailService,
    pub jwt: JwtVerifier,
}
