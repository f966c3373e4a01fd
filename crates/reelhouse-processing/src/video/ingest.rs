//! Video ingestion: validate → stage → probe → remux → upload → record → clean up.

use reelhouse_core::{authorize, AppError, Config, ErrorMetadata, LogLevel, Orientation, Video};
use reelhouse_db::VideoRepository;
use reelhouse_storage::{build_key, Storage};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::probe::GeometryProber;
use crate::process::ProcessRunner;
use crate::remux::FastStartRemuxer;
use crate::staging::StagedUpload;
use crate::validator::{UploadArtifact, UploadPolicy};

/// Pipeline stage reached by an ingestion run, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Validating,
    Staged,
    Probed,
    Remuxed,
    Uploaded,
    Recorded,
    CleanedUp,
}

impl Display for IngestStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            IngestStage::Validating => "validating",
            IngestStage::Staged => "staged",
            IngestStage::Probed => "probed",
            IngestStage::Remuxed => "remuxed",
            IngestStage::Uploaded => "uploaded",
            IngestStage::Recorded => "recorded",
            IngestStage::CleanedUp => "cleaned_up",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub staging_dir: PathBuf,
    /// Prefix for the public video URL. When unset the object store's own URL is used.
    pub public_base_url: Option<String>,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub policy: UploadPolicy,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            staging_dir: config.staging_dir().clone(),
            public_base_url: config.video_public_base_url().map(String::from),
            ffprobe_path: config.ffprobe_path().to_string(),
            ffmpeg_path: config.ffmpeg_path().to_string(),
            policy: UploadPolicy::video(config.max_video_size_bytes()),
        }
    }
}

fn log_failure(video_id: Uuid, stage: IngestStage, err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(video_id = %video_id, stage = %stage, error = %err, "Video ingestion rejected"),
        LogLevel::Warn => tracing::warn!(video_id = %video_id, stage = %stage, error = %err, "Video ingestion failed"),
        LogLevel::Error => tracing::error!(video_id = %video_id, stage = %stage, error = %err, "Video ingestion failed"),
    }
}

/// Runs one upload through the ingestion pipeline.
///
/// The record's URL fields are written only after the processed file is in
/// the object store, and local files are removed on every exit path.
#[derive(Clone)]
pub struct VideoIngestService {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: GeometryProber,
    remuxer: FastStartRemuxer,
    settings: IngestSettings,
}

impl VideoIngestService {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        runner: Arc<dyn ProcessRunner>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            prober: GeometryProber::new(settings.ffprobe_path.clone(), runner.clone()),
            remuxer: FastStartRemuxer::new(settings.ffmpeg_path.clone(), runner),
            repository,
            storage,
            settings,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.settings.policy
    }

    /// Load the record and check that `caller` owns it.
    pub async fn authorize(&self, video_id: Uuid, caller: Uuid) -> Result<Video, AppError> {
        let record = self.repository.get(video_id).await?;
        authorize(record, caller)
    }

    /// Ingest an upload for an already authorized record.
    #[tracing::instrument(skip(self, video, artifact), fields(
        video_id = %video.id,
        upload.size_bytes = artifact.size(),
        upload.content_type = %artifact.content_type
    ))]
    pub async fn ingest(&self, video: Video, artifact: UploadArtifact) -> Result<Video, AppError> {
        let video_id = video.id;
        let start = std::time::Instant::now();

        self.settings.policy.validate(&artifact).map_err(|e| {
            let err = AppError::from(e);
            log_failure(video_id, IngestStage::Validating, &err);
            err
        })?;

        let staged = StagedUpload::create(&self.settings.staging_dir, &artifact.data)
            .await
            .map_err(|e| {
                let err = AppError::Internal(format!("Failed to stage upload: {}", e));
                log_failure(video_id, IngestStage::Validating, &err);
                err
            })?;
        let UploadArtifact {
            data, content_type, ..
        } = artifact;
        drop(data);

        let result = self.process(video_id, &staged, &content_type).await;

        staged.cleanup().await;

        match &result {
            Ok(updated) => tracing::info!(
                video_id = %video_id,
                stage = %IngestStage::CleanedUp,
                video_key = updated.video_key.as_deref().unwrap_or_default(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video ingested"
            ),
            Err((stage, err)) => log_failure(video_id, *stage, err),
        }

        result.map_err(|(_, err)| err)
    }

    /// Runs every stage after staging. Errors carry the last stage reached.
    async fn process(
        &self,
        video_id: Uuid,
        staged: &StagedUpload,
        content_type: &str,
    ) -> Result<Video, (IngestStage, AppError)> {
        let geometry = self
            .prober
            .probe(staged.staged_path())
            .await
            .map_err(|e| (IngestStage::Staged, AppError::from(e)))?;
        let orientation = Orientation::classify(geometry.width, geometry.height);
        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            orientation = %orientation,
            "Classified video orientation"
        );

        self.remuxer
            .remux(staged.staged_path(), staged.processed_path())
            .await
            .map_err(|e| (IngestStage::Probed, AppError::from(e)))?;

        let key = build_key(orientation, "mp4");
        let stored_url = self
            .storage
            .upload_file(key.as_str(), staged.processed_path(), content_type)
            .await
            .map_err(|e| (IngestStage::Remuxed, AppError::StorageFailure(e.to_string())))?;

        let video_url = match &self.settings.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => stored_url,
        };

        match self
            .repository
            .set_video_url(video_id, &video_url, key.as_str())
            .await
        {
            Ok(updated) => {
                tracing::debug!(stage = %IngestStage::Recorded, key = %key, "Video record updated");
                Ok(updated)
            }
            Err(e) => {
                // Nothing references the uploaded object now.
                if let Err(delete_err) = self.storage.delete(key.as_str()).await {
                    tracing::warn!(
                        error = %delete_err,
                        key = %key,
                        "Failed to remove orphaned upload"
                    );
                }
                Err((
                    IngestStage::Uploaded,
                    AppError::RecordUpdateFailure(e.to_string()),
                ))
            }
        }
    }
}
