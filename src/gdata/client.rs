//! Album service API client
//!
//! Issues the create-photo POST, the description PATCH, and the album-feed
//! GET against the service's REST API. Any status in [200, 299] is success;
//! everything else surfaces the status code and raw response body. A 401
//! from any call drops the cached credential so the next attempt has to
//! re-authorize.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::auth::TokenStore;
use crate::gdata::encode::{self, UploadEncoding};
use crate::gdata::errors::UploadError;
use crate::gdata::types::{AlbumFeedResponse, PhotoEntryResponse, RemoteAlbum};

/// Default album feed endpoint for the account's default user
const FEED_BASE: &str = "https://picasaweb.google.com/data/feed/api/user/default";

/// HTTP client timeout; a stalled upload fails instead of hanging its
/// busy indicator forever
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated client for the album service
#[derive(Clone)]
pub struct AlbumClient {
    /// HTTP client shared with the image fetcher
    http_client: Client,
    /// Feed base URL, without trailing slash
    feed_base: String,
    /// Cached bearer credential, invalidated on auth failure
    tokens: TokenStore,
}

impl AlbumClient {
    /// Create a client against the default service endpoint
    pub fn new(tokens: TokenStore) -> Result<Self, UploadError> {
        Self::with_feed_base(tokens, FEED_BASE)
    }

    /// Create a client against a specific feed endpoint
    pub fn with_feed_base(tokens: TokenStore, feed_base: &str) -> Result<Self, UploadError> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            feed_base: feed_base.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// The underlying HTTP client, reused for source image fetches
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Whether a credential is currently available
    pub fn has_credential(&self) -> bool {
        self.tokens.get().is_some()
    }

    fn bearer(&self) -> Result<String, UploadError> {
        self.tokens.get().ok_or(UploadError::NoCredential)
    }

    /// Upload endpoint for an album
    fn album_url(&self, album_id: &str) -> String {
        format!(
            "{}/albumid/{}?alt=json",
            self.feed_base,
            urlencoding::encode(album_id)
        )
    }

    /// Patch endpoint for a photo within an album
    fn photo_url(&self, album_id: &str, photo_id: &str) -> String {
        format!(
            "{}/albumid/{}/photoid/{}?alt=json",
            self.feed_base,
            urlencoding::encode(album_id),
            urlencoding::encode(photo_id)
        )
    }

    /// Create a photo entry in the album.
    ///
    /// Builds the body with the chosen encoding strategy and POSTs it with
    /// the bearer credential. Returns the parsed entry so the caller can
    /// address the follow-up description patch.
    pub async fn create_photo(
        &self,
        album_id: &str,
        encoding: UploadEncoding,
        image_url: &str,
        page_url: &str,
        image_bytes: &[u8],
        image_content_type: &str,
    ) -> Result<PhotoEntryResponse, UploadError> {
        let token = self.bearer()?;
        let encoded = encode::encode_upload(
            encoding,
            image_url,
            page_url,
            image_bytes,
            image_content_type,
        );
        let url = self.album_url(album_id);

        info!(
            album_id = album_id,
            size = image_bytes.len(),
            content_type = image_content_type,
            "Uploading photo"
        );

        let mut request = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", &encoded.content_type);

        if let Some(slug) = &encoded.slug {
            request = request.header("Slug", slug);
        }
        if encoded.mime_version {
            request = request.header("MIME-version", "1.0");
        }

        let response = request.body(encoded.body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = UploadError::from_create_status(status.as_u16(), body);
            if err.is_auth() {
                warn!(album_id = album_id, "Create returned 401, dropping cached credential");
                self.tokens.invalidate();
            }
            return Err(err);
        }

        let entry: PhotoEntryResponse = response
            .json()
            .await
            .map_err(|e| UploadError::BadResponse(e.to_string()))?;

        info!(
            album_id = album_id,
            photo_id = entry.photo_id(),
            "Photo created"
        );
        Ok(entry)
    }

    /// Patch the new photo's description with the page and image URLs.
    ///
    /// A rejected patch does not undo the already-created photo; the photo
    /// simply stays without its description.
    pub async fn patch_description(
        &self,
        album_id: &str,
        photo_id: &str,
        page_url: &str,
        image_url: &str,
    ) -> Result<(), UploadError> {
        let token = self.bearer()?;
        let url = self.photo_url(album_id, photo_id);
        let body = encode::summary_entry_xml(page_url, image_url);

        debug!(album_id = album_id, photo_id = photo_id, "Patching photo description");

        let response = self
            .http_client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("GData-Version", "2")
            .header("If-Match", "*")
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = UploadError::from_patch_status(status.as_u16(), body);
            if err.is_auth() {
                warn!(photo_id = photo_id, "Patch returned 401, dropping cached credential");
                self.tokens.invalidate();
            }
            return Err(err);
        }

        debug!(photo_id = photo_id, "Photo description updated");
        Ok(())
    }

    /// List the account's albums for the connect dialog.
    pub async fn list_albums(&self) -> Result<Vec<RemoteAlbum>, UploadError> {
        let token = self.bearer()?;
        let url = format!("{}?alt=json", self.feed_base);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = UploadError::from_create_status(status.as_u16(), body);
            if err.is_auth() {
                warn!("Album listing returned 401, dropping cached credential");
                self.tokens.invalidate();
            }
            return Err(err);
        }

        let feed: AlbumFeedResponse = response
            .json()
            .await
            .map_err(|e| UploadError::BadResponse(e.to_string()))?;

        let albums = feed.albums();
        info!(count = albums.len(), "Listed remote albums");
        Ok(albums)
    }
}
