//! Reelhouse Storage Library
//!
//! Object store abstraction for processed videos and thumbnail assets, with
//! implementations for S3-compatible stores and the local filesystem.
//!
//! # Storage key format
//!
//! Processed videos live under `{orientation}/{token}.mp4`, where `token` is 32
//! random bytes in unpadded base64url. Keys must not contain `..` or a leading
//! `/`. Key generation is centralized in the `keys` module so every backend and
//! caller agrees on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{build_key, random_hex_token, random_token, StorageKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reelhouse_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
