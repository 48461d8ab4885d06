//! Upload pipeline

pub mod fetch;
pub mod manager;

pub use fetch::ImagePayload;
pub use manager::{ActiveUpload, UploadContext, UploadManager};
