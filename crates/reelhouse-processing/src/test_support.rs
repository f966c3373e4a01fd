//! Deterministic stand-in for ffprobe and ffmpeg.
//!
//! Calls are routed by program name: anything containing `ffprobe` gets the
//! scripted probe output, anything containing `ffmpeg` runs the scripted remux.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::process::{ProcessError, ProcessOutput, ProcessRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum RemuxBehavior {
    /// Copy the `-i` input to the output path and exit 0
    CopyInput,
    /// Exit 0 without writing anything
    SucceedWithoutOutput,
    /// Return this output without touching the filesystem
    Fail(ProcessOutput),
    /// Never finish
    Hang,
}

pub struct ScriptedProcessRunner {
    probe: ProcessOutput,
    remux: RemuxBehavior,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProcessRunner {
    /// Probe reports a single `width`x`height` stream; remux copies its input.
    pub fn with_geometry(width: u32, height: u32) -> Self {
        let stdout = format!(
            r#"{{"streams":[{{"index":0,"codec_name":"h264","codec_type":"video","width":{},"height":{}}}]}}"#,
            width, height
        );
        Self {
            probe: ProcessOutput {
                exit_code: Some(0),
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            },
            remux: RemuxBehavior::CopyInput,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Probe succeeds but lists no streams.
    pub fn without_streams() -> Self {
        Self::with_geometry(0, 0).probe_output(ProcessOutput {
            exit_code: Some(0),
            stdout: br#"{"streams":[]}"#.to_vec(),
            stderr: Vec::new(),
        })
    }

    pub fn probe_output(mut self, output: ProcessOutput) -> Self {
        self.probe = output;
        self
    }

    pub fn remux_behavior(mut self, behavior: RemuxBehavior) -> Self {
        self.remux = behavior;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.program.contains(program))
            .count()
    }

    async fn remux(&self, args: &[String]) -> ProcessOutput {
        match &self.remux {
            RemuxBehavior::CopyInput => {
                let input = args
                    .iter()
                    .position(|a| a == "-i")
                    .and_then(|i| args.get(i + 1))
                    .map(PathBuf::from);
                let output = args.last().map(PathBuf::from);
                let copied = match (input, output) {
                    (Some(input), Some(output)) => tokio::fs::copy(&input, &output).await.ok(),
                    _ => None,
                };
                match copied {
                    Some(_) => ProcessOutput {
                        exit_code: Some(0),
                        ..Default::default()
                    },
                    None => ProcessOutput {
                        exit_code: Some(1),
                        stdout: Vec::new(),
                        stderr: b"scripted remux could not copy input".to_vec(),
                    },
                }
            }
            RemuxBehavior::SucceedWithoutOutput => ProcessOutput {
                exit_code: Some(0),
                ..Default::default()
            },
            RemuxBehavior::Fail(output) => output.clone(),
            RemuxBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedProcessRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput, ProcessError> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                program: program.to_string(),
                args: args.clone(),
            });

        if program.contains("ffprobe") {
            Ok(self.probe.clone())
        } else if program.contains("ffmpeg") {
            Ok(self.remux(&args).await)
        } else {
            Err(ProcessError::Spawn {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not scripted"),
            })
        }
    }
}
