//! Ownership gate shared by every mutating upload path.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Video;

/// Returns the record if `caller` owns it.
///
/// A missing record is reported as `Forbidden`, the same as a foreign one, so
/// callers cannot probe for the existence of other users' videos.
pub fn authorize(record: Option<Video>, caller: Uuid) -> Result<Video, AppError> {
    match record {
        Some(video) if video.is_owned_by(caller) => Ok(video),
        Some(video) => Err(AppError::Forbidden(format!(
            "user {} does not own video {}",
            caller, video.id
        ))),
        None => Err(AppError::Forbidden(format!(
            "video not found for user {}",
            caller
        ))),
    }
}
