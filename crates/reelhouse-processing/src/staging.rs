//! Local staging of uploaded videos.
//!
//! A [`StagedUpload`] owns the staged file and its remux output for the length
//! of one ingestion run. Both are removed exactly once: by [`StagedUpload::cleanup`]
//! on the normal path, or by `Drop` if the run is abandoned midway.

use reelhouse_storage::random_hex_token;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::remux::processed_path_for;

/// Remove a file, treating "already gone" as success.
pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[derive(Debug)]
pub struct StagedUpload {
    staged: PathBuf,
    processed: PathBuf,
    released: bool,
}

impl StagedUpload {
    /// Write `data` to `<dir>/<hex token>.mp4`.
    ///
    /// The guard exists before the first byte is written, so a failed write
    /// does not leave a partial file behind.
    pub async fn create(dir: &Path, data: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;

        let staged = dir.join(format!("{}.mp4", random_hex_token()));
        let guard = StagedUpload {
            processed: processed_path_for(&staged),
            staged,
            released: false,
        };

        fs::write(&guard.staged, data).await?;

        tracing::debug!(
            path = %guard.staged.display(),
            size_bytes = data.len(),
            "Staged upload"
        );

        Ok(guard)
    }

    pub fn staged_path(&self) -> &Path {
        &self.staged
    }

    pub fn processed_path(&self) -> &Path {
        &self.processed
    }

    /// Delete both files. Failures are logged and never returned.
    pub async fn cleanup(mut self) {
        for path in [&self.staged, &self.processed] {
            if let Err(e) = remove_if_exists(path).await {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove staged file"
                );
            }
        }
        self.released = true;
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in [&self.staged, &self.processed] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove staged file on drop"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn dir_is_empty(dir: &Path) -> bool {
        let mut entries = fs::read_dir(dir).await.unwrap();
        entries.next_entry().await.unwrap().is_none()
    }

    #[tokio::test]
    async fn test_create_writes_unique_mp4() {
        let dir = tempdir().unwrap();
        let a = StagedUpload::create(dir.path(), b"first").await.unwrap();
        let b = StagedUpload::create(dir.path(), b"second").await.unwrap();

        assert_ne!(a.staged_path(), b.staged_path());
        assert_eq!(a.staged_path().extension().unwrap(), "mp4");
        assert_eq!(fs::read(a.staged_path()).await.unwrap(), b"first");
        assert!(a
            .processed_path()
            .to_string_lossy()
            .ends_with(".mp4.processed"));

        a.cleanup().await;
        b.cleanup().await;
    }

    #[tokio::test]
    async fn test_cleanup_removes_staged_and_processed() {
        let dir = tempdir().unwrap();
        let staged = StagedUpload::create(dir.path(), b"raw").await.unwrap();
        fs::write(staged.processed_path(), b"processed").await.unwrap();

        staged.cleanup().await;

        assert!(dir_is_empty(dir.path()).await);
    }

    #[tokio::test]
    async fn test_cleanup_without_processed_file() {
        let dir = tempdir().unwrap();
        let staged = StagedUpload::create(dir.path(), b"raw").await.unwrap();

        staged.cleanup().await;

        assert!(dir_is_empty(dir.path()).await);
    }

    #[tokio::test]
    async fn test_drop_removes_files() {
        let dir = tempdir().unwrap();
        {
            let staged = StagedUpload::create(dir.path(), b"raw").await.unwrap();
            fs::write(staged.processed_path(), b"processed").await.unwrap();
        }

        assert!(dir_is_empty(dir.path()).await);
    }

    #[tokio::test]
    async fn test_remove_if_exists_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.mp4");
        fs::write(&path, b"x").await.unwrap();

        remove_if_exists(&path).await.unwrap();
        remove_if_exists(&path).await.unwrap();
        assert!(!path.exists());
    }
}
