//! Reelhouse API Library
//!
//! HTTP surface of the video ingestion service: handlers, extractors,
//! error rendering and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;
pub mod utils;

pub use api_doc::get_openapi_spec;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
