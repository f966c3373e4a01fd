use async_trait::async_trait;
use reelhouse_core::{AppError, Video};
use uuid::Uuid;

/// Keyed access to video records.
///
/// The `set_*` operations touch only their own columns plus `updated_at`, so
/// a video ingest and a thumbnail attach on the same record never clobber
/// each other. Each must be atomic per record.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a record by ID, `None` if it does not exist
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Point the record at a processed video and return the stored row.
    /// Fails with `NotFound` if the record no longer exists.
    async fn set_video_url(
        &self,
        id: Uuid,
        video_url: &str,
        video_key: &str,
    ) -> Result<Video, AppError>;

    /// Point the record at a thumbnail and return the stored row.
    /// Fails with `NotFound` if the record no longer exists.
    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError>;

    /// Insert a new record
    async fn create(&self, video: &Video) -> Result<Video, AppError>;
}
