//! Reelhouse Core Library
//!
//! Domain models, error types, configuration and the ownership gate shared by
//! every Reelhouse component.

pub mod config;
pub mod error;
pub mod models;
pub mod ownership;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, RecordStoreKind, ReelhouseConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Orientation, Video, VideoResponse};
pub use ownership::authorize;
pub use storage_types::StorageBackend;
