//! Upload pipeline and in-flight tracking
//!
//! Each menu click becomes one `UploadContext` run through a linear async
//! chain: credential check, image fetch, encode, create-photo, optional
//! description patch. While a pipeline runs, its tab id and a short label
//! are visible to status queries so the extension can render its busy
//! indicator; the entry is removed on every exit path, success or failure.
//! Uploads from distinct clicks run concurrently with no mutual exclusion
//! and no completion-order guarantees.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::gdata::{AlbumClient, UploadEncoding, UploadError};
use crate::upload::fetch;

/// Truncation applied to the status label. Independent of the 255-char slug.
const LABEL_MAX_LEN: usize = 100;

/// Per-click upload request, owned by exactly one pipeline run
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub service: String,
    pub album_id: String,
    pub album_name: String,
    pub image_url: String,
    pub page_url: String,
    pub tab_id: i64,
}

/// One in-flight upload, as reported to status queries
#[derive(Debug, Clone)]
pub struct ActiveUpload {
    pub tab_id: i64,
    pub album_name: String,
    pub label: String,
}

/// Shorten an image URL for display in the busy indicator
pub fn status_label(image_url: &str) -> String {
    image_url.chars().take(LABEL_MAX_LEN).collect()
}

/// Runs upload pipelines and tracks the ones in flight
pub struct UploadManager {
    client: AlbumClient,
    encoding: UploadEncoding,
    /// Whether to issue the follow-up description patch after a create
    patch_description: bool,
    /// Active uploads by upload id
    active: Arc<RwLock<HashMap<u64, ActiveUpload>>>,
    next_id: AtomicU64,
}

impl UploadManager {
    /// Create a manager using the canonical multipart strategy with the
    /// description patch enabled.
    pub fn new(client: AlbumClient) -> Self {
        Self {
            client,
            encoding: UploadEncoding::Multipart,
            patch_description: true,
            active: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Select the body encoding strategy
    pub fn with_encoding(mut self, encoding: UploadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Enable or disable the follow-up description patch
    pub fn with_patch_description(mut self, patch_description: bool) -> Self {
        self.patch_description = patch_description;
        self
    }

    /// Uploads currently in flight
    pub async fn active(&self) -> Vec<ActiveUpload> {
        self.active.read().await.values().cloned().collect()
    }

    /// Run one upload to completion, returning the created photo's id.
    ///
    /// The busy entry is registered before the first network step and
    /// removed when the pipeline ends either way.
    pub async fn upload(&self, ctx: UploadContext) -> Result<String, UploadError> {
        let upload_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut active = self.active.write().await;
            active.insert(
                upload_id,
                ActiveUpload {
                    tab_id: ctx.tab_id,
                    album_name: ctx.album_name.clone(),
                    label: status_label(&ctx.image_url),
                },
            );
        }

        info!(
            service = %ctx.service,
            album = %ctx.album_name,
            image_url = %status_label(&ctx.image_url),
            tab_id = ctx.tab_id,
            "Upload started"
        );

        let result = self.run_pipeline(&ctx).await;

        {
            let mut active = self.active.write().await;
            active.remove(&upload_id);
        }

        match &result {
            Ok(photo_id) => {
                info!(album = %ctx.album_name, photo_id = %photo_id, "Upload finished");
            }
            Err(e) => {
                warn!(album = %ctx.album_name, error = %e, "Upload failed");
            }
        }

        result
    }

    /// The linear pipeline: any error aborts the remaining steps.
    async fn run_pipeline(&self, ctx: &UploadContext) -> Result<String, UploadError> {
        if !self.client.has_credential() {
            return Err(UploadError::NoCredential);
        }

        let payload = fetch::fetch_image(self.client.http_client(), &ctx.image_url).await?;

        let entry = self
            .client
            .create_photo(
                &ctx.album_id,
                self.encoding,
                &ctx.image_url,
                &ctx.page_url,
                &payload.bytes,
                &payload.content_type,
            )
            .await?;
        let photo_id = entry.photo_id().to_string();

        if self.patch_description {
            // A rejected patch leaves the photo in place without its
            // description; there is no compensating delete.
            self.client
                .patch_description(&ctx.album_id, &photo_id, &ctx.page_url, &ctx.image_url)
                .await?;
        }

        Ok(photo_id)
    }
}
