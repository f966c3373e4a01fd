use async_trait::async_trait;
use reelhouse_core::{AppError, Video};
use reelhouse_db::{InMemoryVideoRepository, VideoRepository};
use reelhouse_processing::test_support::{RemuxBehavior, ScriptedProcessRunner};
use reelhouse_processing::{
    IngestSettings, ProcessOutput, UploadArtifact, UploadPolicy, VideoIngestService,
};
use reelhouse_storage::{LocalStorage, Storage, StorageBackend, StorageResult};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

const CDN: &str = "https://cdn.example.com";
const MP4_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42mdat-payload-moov";

/// Local storage that remembers the content type of every write.
struct RecordingStorage {
    inner: LocalStorage,
    content_types: Mutex<Vec<(String, String)>>,
}

impl RecordingStorage {
    fn record(&self, key: &str, content_type: &str) {
        self.content_types
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string()));
    }

    fn content_types(&self) -> Vec<(String, String)> {
        self.content_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.record(storage_key, content_type);
        self.inner
            .upload_with_key(storage_key, data, content_type)
            .await
    }

    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<String> {
        self.record(storage_key, content_type);
        self.inner.upload_file(storage_key, path, content_type).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.get_presigned_url(storage_key, expires_in).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

struct Harness {
    staging: TempDir,
    objects: TempDir,
    repo: InMemoryVideoRepository,
    runner: Arc<ScriptedProcessRunner>,
    storage: Arc<RecordingStorage>,
    service: VideoIngestService,
    video: Video,
}

impl Harness {
    /// Ownership check followed by ingestion, the order the upload route uses.
    async fn upload(
        &self,
        video_id: Uuid,
        caller: Uuid,
        artifact: UploadArtifact,
    ) -> Result<Video, AppError> {
        let video = self.service.authorize(video_id, caller).await?;
        self.service.ingest(video, artifact).await
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

async fn harness_with(
    runner: ScriptedProcessRunner,
    policy: UploadPolicy,
    repository: Option<Arc<dyn VideoRepository>>,
) -> Harness {
    let staging = tempfile::tempdir().unwrap();
    let objects = tempfile::tempdir().unwrap();
    let repo = InMemoryVideoRepository::new();

    let mut video = Video::new(Uuid::new_v4(), "Boots and Cats");
    video.video_url = Some(format!("{}/other/previous.mp4", CDN));
    repo.insert(video.clone()).await;

    let storage = Arc::new(RecordingStorage {
        inner: LocalStorage::new(objects.path(), "http://localhost:4000/media")
            .await
            .unwrap(),
        content_types: Mutex::new(Vec::new()),
    });
    let runner = Arc::new(runner);
    let settings = IngestSettings {
        staging_dir: staging.path().to_path_buf(),
        public_base_url: Some(CDN.to_string()),
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        policy,
    };
    let service = VideoIngestService::new(
        repository.unwrap_or_else(|| Arc::new(repo.clone())),
        storage.clone(),
        runner.clone(),
        settings,
    );

    Harness {
        staging,
        objects,
        repo,
        runner,
        storage,
        service,
        video,
    }
}

async fn harness(runner: ScriptedProcessRunner) -> Harness {
    harness_with(runner, UploadPolicy::video(1 << 30), None).await
}

fn mp4() -> UploadArtifact {
    UploadArtifact::new(MP4_BYTES.to_vec(), "video/mp4").with_file_name("boots-and-cats.mp4")
}

#[tokio::test]
async fn owner_upload_of_landscape_video_is_stored_under_landscape() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    let updated = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await
        .unwrap();

    let key = updated.video_key.clone().unwrap();
    let url = updated.video_url.clone().unwrap();
    assert!(key.starts_with("landscape/"));
    assert!(key.ends_with(".mp4"));
    assert_eq!(url, format!("{}/{}", CDN, key));

    let stored = std::fs::read(h.objects.path().join(&key)).unwrap();
    assert_eq!(stored, MP4_BYTES);

    let record = h.repo.get(h.video.id).await.unwrap().unwrap();
    assert_eq!(record.video_url.as_deref(), Some(url.as_str()));
    assert_eq!(count_files(h.staging.path()), 0);
}

#[tokio::test]
async fn portrait_geometry_selects_portrait_prefix() {
    let h = harness(ScriptedProcessRunner::with_geometry(1080, 1920)).await;

    let updated = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await
        .unwrap();

    assert!(updated.video_url.unwrap().contains("/portrait/"));
}

#[tokio::test]
async fn square_geometry_selects_other_prefix() {
    let h = harness(ScriptedProcessRunner::with_geometry(1000, 1000)).await;

    let updated = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await
        .unwrap();

    assert!(updated.video_key.unwrap().starts_with("other/"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_write() {
    let h = harness_with(
        ScriptedProcessRunner::with_geometry(1920, 1080),
        UploadPolicy::video(MP4_BYTES.len() - 1),
        None,
    )
    .await;

    let result = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(h.runner.calls().is_empty());
    assert_eq!(count_files(h.staging.path()), 0);
    assert_eq!(count_files(h.objects.path()), 0);
    assert_eq!(h.repo.get(h.video.id).await.unwrap().unwrap(), h.video);
}

#[tokio::test]
async fn wrong_media_type_is_rejected() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    let result = h
        .upload(
            h.video.id,
            h.video.user_id,
            UploadArtifact::new(MP4_BYTES.to_vec(), "video/quicktime"),
        )
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(count_files(h.staging.path()), 0);
}

#[tokio::test]
async fn media_type_with_parameters_is_rejected() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    for declared in ["video/mp4; codecs=avc1", "VIDEO/MP4"] {
        let result = h
            .upload(
                h.video.id,
                h.video.user_id,
                UploadArtifact::new(MP4_BYTES.to_vec(), declared),
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))), "{declared}");
    }

    assert!(h.runner.calls().is_empty());
    assert_eq!(count_files(h.objects.path()), 0);
    assert_eq!(h.repo.get(h.video.id).await.unwrap().unwrap(), h.video);
}

#[tokio::test]
async fn stored_object_is_tagged_with_declared_media_type() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    let updated = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await
        .unwrap();

    assert_eq!(
        h.storage.content_types(),
        vec![(updated.video_key.unwrap(), "video/mp4".to_string())]
    );
}

#[tokio::test]
async fn thumbnail_written_during_ingest_survives() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;
    let thumbnail = "http://localhost:4000/assets/fresh.png";

    let snapshot = h
        .service
        .authorize(h.video.id, h.video.user_id)
        .await
        .unwrap();
    h.repo
        .set_thumbnail_url(h.video.id, thumbnail)
        .await
        .unwrap();

    let updated = h.service.ingest(snapshot, mp4()).await.unwrap();

    assert_eq!(updated.thumbnail_url.as_deref(), Some(thumbnail));
    let record = h.repo.get(h.video.id).await.unwrap().unwrap();
    assert_eq!(record.thumbnail_url.as_deref(), Some(thumbnail));
    assert_eq!(record.video_key, updated.video_key);
    assert_eq!(record.title, h.video.title);
}

#[tokio::test]
async fn non_owner_is_forbidden_without_side_effects() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    let result = h.upload(h.video.id, Uuid::new_v4(), mp4()).await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(h.runner.calls().is_empty());
    assert_eq!(count_files(h.staging.path()), 0);
    assert_eq!(count_files(h.objects.path()), 0);
    assert_eq!(h.repo.get(h.video.id).await.unwrap().unwrap(), h.video);
}

#[tokio::test]
async fn unknown_video_is_forbidden() {
    let h = harness(ScriptedProcessRunner::with_geometry(1920, 1080)).await;

    let result = h
        .upload(Uuid::new_v4(), h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn probe_without_streams_fails_and_cleans_up() {
    let h = harness(ScriptedProcessRunner::without_streams()).await;

    let result = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::ProbeFailure(_))));
    assert_eq!(h.runner.calls_to("ffprobe"), 1);
    assert_eq!(h.runner.calls_to("ffmpeg"), 0);
    assert_eq!(count_files(h.staging.path()), 0);
    assert_eq!(count_files(h.objects.path()), 0);

    let record = h.repo.get(h.video.id).await.unwrap().unwrap();
    assert_eq!(record.video_url, h.video.video_url);
}

#[tokio::test]
async fn remux_failure_uploads_nothing() {
    let h = harness(
        ScriptedProcessRunner::with_geometry(1920, 1080).remux_behavior(RemuxBehavior::Fail(
            ProcessOutput {
                exit_code: Some(1),
                stdout: Vec::new(),
                stderr: b"Conversion failed!".to_vec(),
            },
        )),
    )
    .await;

    let result = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::RemuxFailure(_))));
    assert_eq!(count_files(h.staging.path()), 0);
    assert_eq!(count_files(h.objects.path()), 0);
    assert_eq!(h.repo.get(h.video.id).await.unwrap().unwrap(), h.video);
}

#[tokio::test]
async fn remux_without_output_is_a_remux_failure() {
    let h = harness(
        ScriptedProcessRunner::with_geometry(1920, 1080)
            .remux_behavior(RemuxBehavior::SucceedWithoutOutput),
    )
    .await;

    let result = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::RemuxFailure(_))));
    assert_eq!(count_files(h.objects.path()), 0);
}

struct FailingUpdates(InMemoryVideoRepository);

#[async_trait]
impl VideoRepository for FailingUpdates {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.0.get(id).await
    }

    async fn set_video_url(
        &self,
        _id: Uuid,
        _video_url: &str,
        _video_key: &str,
    ) -> Result<Video, AppError> {
        Err(AppError::Internal("connection reset".to_string()))
    }

    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        self.0.set_thumbnail_url(id, thumbnail_url).await
    }

    async fn create(&self, video: &Video) -> Result<Video, AppError> {
        self.0.create(video).await
    }
}

#[tokio::test]
async fn record_update_failure_removes_uploaded_object() {
    let repo = InMemoryVideoRepository::new();
    let failing: Arc<dyn VideoRepository> = Arc::new(FailingUpdates(repo.clone()));
    let h = harness_with(
        ScriptedProcessRunner::with_geometry(1920, 1080),
        UploadPolicy::video(1 << 30),
        Some(failing),
    )
    .await;
    repo.insert(h.video.clone()).await;

    let result = h
        .upload(h.video.id, h.video.user_id, mp4())
        .await;

    assert!(matches!(result, Err(AppError::RecordUpdateFailure(_))));
    assert_eq!(count_files(h.objects.path()), 0);
    assert_eq!(count_files(h.staging.path()), 0);
}

#[tokio::test]
async fn abandoned_ingest_still_removes_staged_files() {
    let h = harness(
        ScriptedProcessRunner::with_geometry(1920, 1080).remux_behavior(RemuxBehavior::Hang),
    )
    .await;

    let result = tokio::time::timeout(
        Duration::from_millis(200),
        h.upload(h.video.id, h.video.user_id, mp4()),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(h.runner.calls_to("ffmpeg"), 1);
    assert_eq!(count_files(h.staging.path()), 0);
    assert_eq!(h.repo.get(h.video.id).await.unwrap().unwrap(), h.video);
}

#[tokio::test]
async fn concurrent_uploads_get_distinct_keys() {
    let h = harness(ScriptedProcessRunner::with_geometry(1280, 720)).await;

    let (a, b) = tokio::join!(
        h.upload(h.video.id, h.video.user_id, mp4()),
        h.upload(h.video.id, h.video.user_id, mp4()),
    );

    assert_ne!(a.unwrap().video_key, b.unwrap().video_key);
    assert_eq!(count_files(h.objects.path()), 2);
    assert_eq!(count_files(h.staging.path()), 0);
}
