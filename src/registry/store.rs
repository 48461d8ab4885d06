//! Album registry persistence
//!
//! The registry maps a service type to the set of connected albums
//! (album id to display name). It is loaded at startup, read during uploads,
//! and mutated only through the settings commands; every mutation is written
//! back atomically before the change is acknowledged. Display names are
//! captured at connect time and never synced with the remote service.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Service type identifier for the web albums backend
pub const WEB_ALBUM_SERVICE: &str = "picasa";

/// On-disk shape of the registry file
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    /// serviceType -> albumId -> albumName. No empty inner map persists.
    #[serde(default)]
    albums: BTreeMap<String, BTreeMap<String, String>>,
    /// One-time flag recording that the first-run settings surface was shown
    #[serde(default)]
    installed: bool,
}

/// A connected album as handed to menu construction and uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedAlbum {
    pub service: String,
    pub album_id: String,
    pub album_name: String,
}

/// Persisted album registry
pub struct AlbumRegistry {
    /// Location of the registry file
    path: PathBuf,
    data: RegistryFile,
}

impl AlbumRegistry {
    /// Default registry location under the user config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("photoclip")
            .join("albums.json")
    }

    /// Load the registry from disk; a missing file yields an empty registry
    /// with the first-run flag unset.
    pub fn load(path: PathBuf) -> Result<Self> {
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse registry file: {:?}", path))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No registry file yet, starting empty");
                RegistryFile::default()
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read registry file: {:?}", path))
            }
        };

        Ok(Self { path, data })
    }

    /// Persist the registry atomically
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let json =
            serde_json::to_vec_pretty(&self.data).context("Failed to serialize registry")?;

        // Write atomically using tempfile
        let parent = self.path.parent().unwrap_or(Path::new("/tmp"));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create temp file for registry")?;
        tmp.write_all(&json).context("Failed to write registry")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to persist registry file: {:?}", self.path))?;

        debug!(path = %self.path.display(), "Saved album registry");
        Ok(())
    }

    /// Connect an album. Overwrites the stored name if the album is already
    /// connected.
    pub fn add_album(&mut self, service: &str, album_id: &str, album_name: &str) {
        self.data
            .albums
            .entry(service.to_string())
            .or_default()
            .insert(album_id.to_string(), album_name.to_string());
        info!(
            service = service,
            album_id = album_id,
            album_name = album_name,
            "Connected album"
        );
    }

    /// Disconnect an album. Removing the last album of a service type
    /// removes the service-type entry itself.
    pub fn remove_album(&mut self, service: &str, album_id: &str) -> bool {
        let Some(entries) = self.data.albums.get_mut(service) else {
            return false;
        };
        let removed = entries.remove(album_id).is_some();
        if entries.is_empty() {
            self.data.albums.remove(service);
        }
        if removed {
            info!(service = service, album_id = album_id, "Disconnected album");
        }
        removed
    }

    /// Whether any album of this service type is connected
    pub fn contains_service(&self, service: &str) -> bool {
        self.data.albums.contains_key(service)
    }

    /// Display name of a connected album
    pub fn album_name(&self, service: &str, album_id: &str) -> Option<&str> {
        self.data
            .albums
            .get(service)
            .and_then(|entries| entries.get(album_id))
            .map(String::as_str)
    }

    /// Albums for one service type, sorted by display name (the menu order)
    pub fn albums_sorted(&self, service: &str) -> Vec<ConnectedAlbum> {
        let mut albums: Vec<ConnectedAlbum> = self
            .data
            .albums
            .get(service)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(id, name)| ConnectedAlbum {
                        service: service.to_string(),
                        album_id: id.clone(),
                        album_name: name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        albums.sort_by(|a, b| a.album_name.cmp(&b.album_name));
        albums
    }

    /// All connected albums across services, name-sorted within each service
    pub fn all_albums(&self) -> Vec<ConnectedAlbum> {
        self.data
            .albums
            .keys()
            .flat_map(|service| self.albums_sorted(service))
            .collect()
    }

    /// Whether no albums are connected at all
    pub fn is_empty(&self) -> bool {
        self.data.albums.is_empty()
    }

    /// Whether the first-run settings surface has already been shown
    pub fn installed(&self) -> bool {
        self.data.installed
    }

    /// Record that the first-run settings surface has been shown
    pub fn mark_installed(&mut self) {
        self.data.installed = true;
    }
}
