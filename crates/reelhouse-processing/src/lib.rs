//! Reelhouse media processing
//!
//! Everything between an accepted upload and an updated video record: the
//! external process capability, ffprobe geometry probing, fast-start remuxing,
//! local staging, upload validation and the ingestion services built on them.

pub mod probe;
pub mod process;
pub mod remux;
pub mod staging;
pub mod thumbnail;
pub mod validator;
pub mod video;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use probe::{Geometry, GeometryProber, ProbeError};
pub use process::{ProcessError, ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use remux::{processed_path_for, FastStartRemuxer, RemuxError};
pub use staging::{remove_if_exists, StagedUpload};
pub use thumbnail::ThumbnailService;
pub use validator::{UploadArtifact, UploadPolicy, ValidationError};
pub use video::{IngestSettings, IngestStage, VideoIngestService};
