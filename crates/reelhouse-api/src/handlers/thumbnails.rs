use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::{read_upload_field, VideoId};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::IntoResponse,
    Json,
};
use reelhouse_core::VideoResponse;
use std::sync::Arc;

/// Upload a thumbnail image for an existing record
#[utoipa::path(
    post,
    path = "/api/thumbnails/{video_id}",
    tag = "thumbnails",
    params(
        ("video_id" = uuid::Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Single file field `thumbnail` (image/jpeg or image/png)"),
    responses(
        (status = 200, description = "Thumbnail attached", body = VideoResponse),
        (status = 400, description = "Invalid ID or upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own the video", body = ErrorResponse),
        (status = 500, description = "Record update failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(video_id = %video_id.0, user_id = %user.user_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    video_id: VideoId,
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state.thumbnails.authorize(video_id.0, user.user_id).await?;
    let artifact = read_upload_field(multipart, state.thumbnails.policy()).await?;

    let updated = state.thumbnails.attach(video, artifact).await?;

    Ok(Json(VideoResponse::from(updated)))
}
