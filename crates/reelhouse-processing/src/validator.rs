//! Upload validation.
//!
//! Every check here runs before anything is written anywhere.

use bytes::Bytes;
use reelhouse_core::AppError;

/// Validation failures for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Missing file field '{0}'")]
    MissingField(String),

    #[error("Multiple '{0}' fields are not allowed; send exactly one")]
    DuplicateField(String),

    #[error("Unexpected form field '{0}'")]
    UnexpectedField(String),

    #[error("Field '{0}' must be a file")]
    NotAFile(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// A file received from a client, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadArtifact {
    pub data: Bytes,
    /// Media type declared by the client
    pub content_type: String,
    pub file_name: Option<String>,
}

impl UploadArtifact {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Field name, size limit and accepted media types for one upload kind.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    field_name: &'static str,
    max_size: usize,
    allowed_content_types: Vec<String>,
}

impl UploadPolicy {
    pub fn new(field_name: &'static str, max_size: usize, allowed_content_types: &[&str]) -> Self {
        Self {
            field_name,
            max_size,
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        }
    }

    /// Field `video`, MP4 only.
    pub fn video(max_size: usize) -> Self {
        Self::new("video", max_size, &["video/mp4"])
    }

    /// Field `thumbnail`, JPEG or PNG.
    pub fn thumbnail(max_size: usize) -> Self {
        Self::new("thumbnail", max_size, &["image/jpeg", "image/png"])
    }

    pub fn field_name(&self) -> &'static str {
        self.field_name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn validate_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        if size > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// The declared type must equal one of the allowed types byte for byte;
    /// parameters and case variants are rejected.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if !self
            .allowed_content_types
            .iter()
            .any(|allowed| allowed == content_type)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }
        Ok(())
    }

    pub fn validate(&self, artifact: &UploadArtifact) -> Result<(), ValidationError> {
        self.validate_size(artifact.size())?;
        self.validate_content_type(&artifact.content_type)
    }
}
