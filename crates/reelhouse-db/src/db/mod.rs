//! Database repositories for data access layer
//
// Repository trait shared by all record stores
pub mod traits;
//
// Postgres-backed video records
pub mod video;
//
// Process-local record store
pub mod memory;

pub use memory::InMemoryVideoRepository;
pub use traits::VideoRepository;
pub use video::PgVideoRepository;
