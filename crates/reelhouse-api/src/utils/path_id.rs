//! Record ID path parameter

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use reelhouse_core::AppError;
use uuid::Uuid;

use crate::error::HttpAppError;

/// The `{video_id}` path segment, parsed as a UUID.
///
/// Absent or malformed IDs are rejected with `BadRequest` before the caller's
/// identity is checked.
#[derive(Debug, Clone, Copy)]
pub struct VideoId(pub Uuid);

fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest("Missing video ID".to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid video ID '{}'", raw)))
}

impl<S> FromRequestParts<S> for VideoId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid video ID: {}", e.body_text())))?;
        Ok(VideoId(parse_video_id(&raw)?))
    }
}
