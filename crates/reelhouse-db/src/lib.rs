//! Reelhouse record store
//!
//! Video records are read and written through [`VideoRepository`]. Production
//! uses the Postgres implementation; tests and local runs can use the
//! in-memory one.

pub mod db;

pub use db::{InMemoryVideoRepository, PgVideoRepository, VideoRepository};
