//! Web photo album service API client

pub mod client;
pub mod encode;
pub mod errors;
pub mod types;

pub use client::AlbumClient;
pub use encode::{EncodedUpload, UploadEncoding, BOUNDARY};
pub use errors::UploadError;
pub use types::*;
