//! Video ingestion module

pub mod ingest;

pub use ingest::{IngestSettings, IngestStage, VideoIngestService};
