//! Thumbnail attachment: validate → write to the public asset root → record.

use reelhouse_core::{authorize, AppError, Video};
use reelhouse_db::VideoRepository;
use reelhouse_storage::{random_token, Storage};
use std::sync::Arc;
use uuid::Uuid;

use crate::validator::{UploadArtifact, UploadPolicy};

/// File extension for an allowed image type (`image/jpeg` -> `jpeg`).
fn extension_for(content_type: &str) -> &str {
    content_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or("bin")
}

#[derive(Clone)]
pub struct ThumbnailService {
    repository: Arc<dyn VideoRepository>,
    assets: Arc<dyn Storage>,
    policy: UploadPolicy,
}

impl ThumbnailService {
    /// `assets` is the directory served publicly under the assets base URL.
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        assets: Arc<dyn Storage>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            repository,
            assets,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn authorize(&self, video_id: Uuid, caller: Uuid) -> Result<Video, AppError> {
        let record = self.repository.get(video_id).await?;
        authorize(record, caller)
    }

    /// Store the image as `<token>.<ext>` and point the record at it.
    #[tracing::instrument(skip(self, video, artifact), fields(video_id = %video.id, upload.size_bytes = artifact.size()))]
    pub async fn attach(&self, video: Video, artifact: UploadArtifact) -> Result<Video, AppError> {
        self.policy.validate(&artifact)?;
        let content_type = artifact.content_type.as_str();
        let asset_key = format!("{}.{}", random_token(), extension_for(content_type));

        let url = self
            .assets
            .upload_with_key(&asset_key, artifact.data.to_vec(), content_type)
            .await
            .map_err(|e| AppError::StorageFailure(e.to_string()))?;

        match self.repository.set_thumbnail_url(video.id, &url).await {
            Ok(updated) => {
                tracing::info!(
                    video_id = %updated.id,
                    asset_key = %asset_key,
                    "Thumbnail attached"
                );
                Ok(updated)
            }
            Err(e) => {
                if let Err(delete_err) = self.assets.delete(&asset_key).await {
                    tracing::warn!(
                        error = %delete_err,
                        asset_key = %asset_key,
                        "Failed to remove orphaned thumbnail"
                    );
                }
                Err(AppError::RecordUpdateFailure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhouse_db::InMemoryVideoRepository;
    use reelhouse_storage::LocalStorage;
    use tempfile::tempdir;

    async fn attach_as(
        service: &ThumbnailService,
        video_id: Uuid,
        caller: Uuid,
        artifact: UploadArtifact,
    ) -> Result<Video, AppError> {
        let video = service.authorize(video_id, caller).await?;
        service.attach(video, artifact).await
    }

    async fn service(
        dir: &std::path::Path,
    ) -> (ThumbnailService, InMemoryVideoRepository, Video) {
        let repo = InMemoryVideoRepository::new();
        let video = Video::new(Uuid::new_v4(), "clip");
        repo.insert(video.clone()).await;
        let assets = LocalStorage::new(dir, "http://localhost:4000/assets")
            .await
            .unwrap();
        let service = ThumbnailService::new(
            Arc::new(repo.clone()),
            Arc::new(assets),
            UploadPolicy::thumbnail(10 << 20),
        );
        (service, repo, video)
    }

    #[test]
    fn test_extension_from_subtype() {
        assert_eq!(extension_for("image/jpeg"), "jpeg");
        assert_eq!(extension_for("image/png"), "png");
    }

    #[tokio::test]
    async fn test_owner_attaches_png() {
        let dir = tempdir().unwrap();
        let (service, repo, video) = service(dir.path()).await;

        let updated = attach_as(
            &service,
            video.id,
            video.user_id,
            UploadArtifact::new(b"\x89PNG".to_vec(), "image/png"),
        )
        .await
        .unwrap();

        let url = updated.thumbnail_url.unwrap();
        assert!(url.starts_with("http://localhost:4000/assets/"));
        assert!(url.ends_with(".png"));

        let file_name = url.rsplit('/').next().unwrap();
        assert!(dir.path().join(file_name).exists());
        assert_eq!(
            repo.get(video.id).await.unwrap().unwrap().thumbnail_url.as_deref(),
            Some(url.as_str())
        );
    }

    #[tokio::test]
    async fn test_non_owner_writes_nothing() {
        let dir = tempdir().unwrap();
        let (service, repo, video) = service(dir.path()).await;

        let result = attach_as(
            &service,
            video.id,
            Uuid::new_v4(),
            UploadArtifact::new(b"jpeg".to_vec(), "image/jpeg"),
        )
        .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(repo.get(video.id).await.unwrap().unwrap().thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_wrong_type_is_bad_request() {
        let dir = tempdir().unwrap();
        let (service, _repo, video) = service(dir.path()).await;

        let result = attach_as(
            &service,
            video.id,
            video.user_id,
            UploadArtifact::new(b"GIF89a".to_vec(), "image/gif"),
        )
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
