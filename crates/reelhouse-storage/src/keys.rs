//! Storage key generation.
//!
//! Key format: `{orientation}/{token}.{extension}`.

use base64::Engine;
use rand::RngCore;
use reelhouse_core::Orientation;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::traits::{StorageError, StorageResult};

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

fn random_bytes() -> [u8; TOKEN_BYTES] {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// URL- and filesystem-safe random token (unpadded base64url, 43 chars).
pub fn random_token() -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes())
}

/// Hex random token (64 chars), for local file names.
pub fn random_hex_token() -> String {
    hex::encode(random_bytes())
}

/// Reject keys that could escape a backend's root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Object store key of a processed artifact. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a fresh key namespaced by orientation: `landscape/<token>.mp4`.
pub fn build_key(orientation: Orientation, extension: &str) -> StorageKey {
    StorageKey(format!(
        "{}/{}.{}",
        orientation.as_str(),
        random_token(),
        extension.trim_start_matches('.')
    ))
}
