pub mod path_id;
pub mod upload;

pub use path_id::VideoId;
pub use upload::read_upload_field;
