//! External process capability.
//!
//! ffprobe and ffmpeg are always launched through [`ProcessRunner`] so the
//! pipeline can be exercised without the real binaries.

use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Collected result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Trimmed, lossily decoded stderr for logs and error messages.
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` to completion and collect its output.
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput, ProcessError>;
}

/// Runs children with `tokio::process`.
///
/// The child is killed when the returned future is dropped, so an abandoned
/// request does not leave ffmpeg running.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

impl TokioProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[tracing::instrument(skip(self, args), fields(process.executable.name = %program))]
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput, ProcessError> {
        let start = std::time::Instant::now();

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                tracing::warn!(
                    program = %program,
                    timeout_secs = limit.as_secs(),
                    "Process timed out, killing child"
                );
                ProcessError::TimedOut {
                    program: program.to_string(),
                    timeout: limit,
                }
            })?,
            None => wait.await,
        }
        .map_err(|source| ProcessError::Io {
            program: program.to_string(),
            source,
        })?;

        tracing::debug!(
            program = %program,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Process finished"
        );

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[tokio::test]
    async fn test_collects_stdout_and_exit_code() {
        let runner = TokioProcessRunner::default();
        let output = runner
            .run("sh", &args(&["-c", "printf hello; exit 3"]))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"hello");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let runner = TokioProcessRunner::default();
        let result = runner.run("definitely-not-a-real-binary", &[]).await;
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = TokioProcessRunner::new(Some(Duration::from_millis(100)));
        let start = std::time::Instant::now();
        let result = runner.run("sleep", &args(&["5"])).await;

        assert!(matches!(result, Err(ProcessError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
