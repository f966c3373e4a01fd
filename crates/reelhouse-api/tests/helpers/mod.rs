//! Test helpers: build the router against in-memory collaborators.
//!
//! Records live in an `InMemoryVideoRepository`, objects and thumbnails in
//! temporary directories, and ffprobe/ffmpeg are replaced by a
//! `ScriptedProcessRunner`.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reelhouse_api::auth::JwtClaims;
use reelhouse_api::setup::{routes, services};
use reelhouse_core::{Config, RecordStoreKind, ReelhouseConfig, StorageBackend, Video};
use reelhouse_db::InMemoryVideoRepository;
use reelhouse_processing::test_support::ScriptedProcessRunner;
use reelhouse_storage::LocalStorage;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const JWT_SECRET: &str = "reelhouse-test-secret-at-least-32-characters";
pub const CDN: &str = "https://cdn.example.com";
pub const OBJECTS_BASE_URL: &str = "http://localhost:4000/media";
pub const ASSETS_BASE_URL: &str = "http://localhost:4000/assets";
pub const MP4_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42mdat-payload-moov";

pub struct TestApp {
    pub server: TestServer,
    pub repo: InMemoryVideoRepository,
    pub runner: Arc<ScriptedProcessRunner>,
    /// Existing record owned by `owner`
    pub video: Video,
    pub owner: Uuid,
    pub staging: TempDir,
    pub objects: TempDir,
    pub assets: TempDir,
}

impl TestApp {
    pub fn owner_token(&self) -> String {
        token_for(self.owner)
    }
}

pub struct TestAppBuilder {
    runner: ScriptedProcessRunner,
    max_video_size_bytes: usize,
    presign_video_urls: bool,
}

impl TestAppBuilder {
    pub fn new(runner: ScriptedProcessRunner) -> Self {
        Self {
            runner,
            max_video_size_bytes: 1 << 30,
            presign_video_urls: false,
        }
    }

    pub fn max_video_size_bytes(mut self, max: usize) -> Self {
        self.max_video_size_bytes = max;
        self
    }

    pub fn presign_video_urls(mut self) -> Self {
        self.presign_video_urls = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let staging = tempfile::tempdir().expect("staging dir");
        let objects = tempfile::tempdir().expect("objects dir");
        let assets = tempfile::tempdir().expect("assets dir");

        let config = test_config(
            staging.path(),
            objects.path(),
            assets.path(),
            self.max_video_size_bytes,
            self.presign_video_urls,
        );

        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let mut video = Video::new(owner, "Boots and Cats");
        video.video_url = Some(format!("{}/other/previous.mp4", CDN));
        repo.insert(video.clone()).await;

        let storage = LocalStorage::new(objects.path(), OBJECTS_BASE_URL)
            .await
            .expect("object storage");
        let asset_storage = LocalStorage::new(assets.path(), ASSETS_BASE_URL)
            .await
            .expect("asset storage");
        let runner = Arc::new(self.runner);

        let state = services::build_state(
            config.clone(),
            Arc::new(repo.clone()),
            Arc::new(storage),
            Arc::new(asset_storage),
            runner.clone(),
        );
        let app = routes::setup_routes(&config, state).expect("routes");
        let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

        TestApp {
            server,
            repo,
            runner,
            video,
            owner,
            staging,
            objects,
            assets,
        }
    }
}

pub async fn setup_test_app(runner: ScriptedProcessRunner) -> TestApp {
    TestAppBuilder::new(runner).build().await
}

fn test_config(
    staging: &Path,
    objects: &Path,
    assets: &Path,
    max_video_size_bytes: usize,
    presign_video_urls: bool,
) -> Config {
    Config(Box::new(ReelhouseConfig {
        server_port: 4000,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        jwt_secret: JWT_SECRET.to_string(),
        log_format: "compact".to_string(),
        record_store: RecordStoreKind::Memory,
        database_url: None,
        db_max_connections: 5,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(objects.display().to_string()),
        local_storage_base_url: Some(OBJECTS_BASE_URL.to_string()),
        video_public_base_url: Some(CDN.to_string()),
        presign_video_urls,
        presign_ttl_secs: 3600,
        assets_root: assets.to_path_buf(),
        assets_base_url: ASSETS_BASE_URL.to_string(),
        staging_dir: staging.to_path_buf(),
        ffprobe_path: "ffprobe".to_string(),
        ffmpeg_path: "ffmpeg".to_string(),
        process_timeout_secs: 0,
        max_video_size_bytes,
        max_thumbnail_size_bytes: 10 * 1024 * 1024,
    }))
}

/// HS256 token for `user_id`, valid for an hour.
pub fn token_for(user_id: Uuid) -> String {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Number of regular files under `dir`, recursively.
pub fn count_files(dir: &Path) -> usize {
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
