//! Geometry probing with ffprobe.

use reelhouse_core::AppError;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::process::{ProcessError, ProcessRunner};

/// Pixel dimensions of the first video stream. Both are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe could not be run: {0}")]
    Launch(#[from] ProcessError),

    #[error("ffprobe exited with {exit_code:?}: {stderr}")]
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("unusable ffprobe output: {0}")]
    InvalidData(String),
}

impl From<ProbeError> for AppError {
    fn from(err: ProbeError) -> Self {
        AppError::ProbeFailure(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<i64>,
    height: Option<i64>,
}

/// Extract the first stream's dimensions from ffprobe's JSON output.
pub fn parse_geometry(stdout: &[u8]) -> Result<Geometry, ProbeError> {
    let output: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProbeError::InvalidData(format!("not valid JSON: {}", e)))?;

    let stream = output
        .streams
        .first()
        .ok_or_else(|| ProbeError::InvalidData("no video stream found".to_string()))?;

    let dimension = |value: Option<i64>, name: &str| -> Result<u32, ProbeError> {
        value
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| ProbeError::InvalidData(format!("missing or non-positive {}", name)))
    };

    Ok(Geometry {
        width: dimension(stream.width, "width")?,
        height: dimension(stream.height, "height")?,
    })
}

/// Reads frame dimensions of a local media file. No retries.
#[derive(Clone)]
pub struct GeometryProber {
    ffprobe_path: String,
    runner: Arc<dyn ProcessRunner>,
}

impl GeometryProber {
    pub fn new(ffprobe_path: impl Into<String>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            runner,
        }
    }

    fn args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());
        args
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> Result<Geometry, ProbeError> {
        let output = self
            .runner
            .run(&self.ffprobe_path, &Self::args(path))
            .await?;

        if !output.success() {
            return Err(ProbeError::ProcessFailed {
                exit_code: output.exit_code,
                stderr: output.stderr_lossy(),
            });
        }

        let geometry = parse_geometry(&output.stdout)?;
        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            "Probed video geometry"
        );
        Ok(geometry)
    }
}
