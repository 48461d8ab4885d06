//! Persisted album registry

pub mod store;

pub use store::{AlbumRegistry, ConnectedAlbum, WEB_ALBUM_SERVICE};
