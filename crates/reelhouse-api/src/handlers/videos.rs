use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::{read_upload_field, VideoId};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::IntoResponse,
    Json,
};
use reelhouse_core::{authorize, VideoResponse};
use std::sync::Arc;

/// Upload a video file for an existing record
///
/// The file is probed, remuxed for fast start and stored under its orientation.
/// The record's video URL is replaced only when every step succeeds.
#[utoipa::path(
    post,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = uuid::Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Single file field `video` (video/mp4)"),
    responses(
        (status = 200, description = "Video ingested", body = VideoResponse),
        (status = 400, description = "Invalid ID or upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 422, description = "File could not be probed", body = ErrorResponse),
        (status = 500, description = "Processing or record update failed", body = ErrorResponse),
        (status = 502, description = "Object store write failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(video_id = %video_id.0, user_id = %user.user_id, operation = "upload_video")
)]
pub async fn upload_video(
    video_id: VideoId,
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state.ingest.authorize(video_id.0, user.user_id).await?;
    let artifact = read_upload_field(multipart, state.ingest.policy()).await?;

    let updated = state.ingest.ingest(video, artifact).await?;

    Ok(Json(VideoResponse::from(updated)))
}

/// Get a video record
///
/// With `PRESIGN_VIDEO_URLS` enabled the returned video URL is a time-limited
/// signed URL instead of the public one.
#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = uuid::Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = VideoResponse),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state),
    fields(video_id = %video_id.0, user_id = %user.user_id, operation = "get_video")
)]
pub async fn get_video(
    video_id: VideoId,
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.videos.get(video_id.0).await?;
    let video = authorize(record, user.user_id)?;

    let presign_key = video
        .video_key
        .clone()
        .filter(|_| state.config.presign_video_urls());

    let mut response = VideoResponse::from(video);
    if let Some(key) = presign_key {
        let url = state
            .storage
            .get_presigned_url(&key, state.config.presign_ttl())
            .await?;
        response.video_url = Some(url);
    }

    Ok(Json(response))
}
