//! Fast-start remuxing with ffmpeg.
//!
//! Streams are copied untouched; only the container is rewritten so the moov
//! atom sits at the front of the file.

use reelhouse_core::AppError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::process::{ProcessError, ProcessRunner};

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("ffmpeg could not be run: {0}")]
    Launch(#[from] ProcessError),

    #[error("ffmpeg exited with {exit_code:?}: {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("ffmpeg reported success but {0} is missing or empty")]
    MissingOutput(PathBuf),
}

impl From<RemuxError> for AppError {
    fn from(err: RemuxError) -> Self {
        AppError::RemuxFailure(err.to_string())
    }
}

/// Remux output path for a staged input: `<input>.processed`.
pub fn processed_path_for(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".processed");
    PathBuf::from(name)
}

#[derive(Clone)]
pub struct FastStartRemuxer {
    ffmpeg_path: String,
    runner: Arc<dyn ProcessRunner>,
}

impl FastStartRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            runner,
        }
    }

    fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into(), "-i".into()];
        args.push(input.as_os_str().to_owned());
        args.extend(
            [
                "-movflags",
                "faststart",
                "-map_metadata",
                "0",
                "-codec",
                "copy",
                "-f",
                "mp4",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Write a fast-start copy of `input` to `output`.
    ///
    /// Fails on a non-zero exit and when ffmpeg leaves no usable output file.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "remux"
    ))]
    pub async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        let start = std::time::Instant::now();
        let result = self
            .runner
            .run(&self.ffmpeg_path, &Self::args(input, output))
            .await?;

        if !result.success() {
            return Err(RemuxError::ProcessFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_lossy(),
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => {
                tracing::info!(
                    output_bytes = meta.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Fast-start remux complete"
                );
                Ok(())
            }
            _ => Err(RemuxError::MissingOutput(output.to_path_buf())),
        }
    }
}
