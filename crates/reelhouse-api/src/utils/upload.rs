//! Multipart upload extraction

use axum::extract::{multipart::MultipartRejection, Multipart};
use bytes::BytesMut;
use reelhouse_processing::{UploadArtifact, UploadPolicy, ValidationError};

use crate::error::HttpAppError;

/// Read exactly one file field named after `policy`'s field from `multipart`.
///
/// Handlers extract the body as `Result<Multipart, MultipartRejection>` and
/// call this only after the ownership check, so a non-owner sees 403 whatever
/// the body looks like.
///
/// The field is read chunk by chunk and rejected as soon as it exceeds the
/// policy's size limit. Any other field, a second copy of the file field, or
/// a plain text value in its place is a bad request. The media type is left
/// for the ingestion service to check.
pub async fn read_upload_field(
    multipart: Result<Multipart, MultipartRejection>,
    policy: &UploadPolicy,
) -> Result<UploadArtifact, HttpAppError> {
    let mut multipart = multipart?;
    let expected = policy.field_name();
    let mut artifact: Option<UploadArtifact> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name != expected {
            return Err(ValidationError::UnexpectedField(name).into());
        }
        if artifact.is_some() {
            return Err(ValidationError::DuplicateField(name).into());
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(ValidationError::NotAFile(name).into());
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > policy.max_size() {
                return Err(ValidationError::FileTooLarge {
                    size: data.len() + chunk.len(),
                    max: policy.max_size(),
                }
                .into());
            }
            data.extend_from_slice(&chunk);
        }

        artifact = Some(UploadArtifact::new(data.freeze(), content_type).with_file_name(file_name));
    }

    artifact.ok_or_else(|| ValidationError::MissingField(expected.to_string()).into())
}
