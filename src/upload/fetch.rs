//! Source image retrieval
//!
//! One-shot GET for the clicked image. The response is read as raw bytes so
//! binary image data is never corrupted, and the declared content type is
//! carried along for the upload body. A failed or non-2xx fetch aborts the
//! upload; there are no retries.

use reqwest::Client;
use tracing::debug;

use crate::gdata::UploadError;

/// Content type assumed when the image server does not declare one
const FALLBACK_CONTENT_TYPE: &str = "image/png";

/// Fetched image bytes plus their declared content type
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Strip any parameters (e.g. charset) from a Content-Type header value
fn media_type(header: Option<&str>) -> String {
    header
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Retrieve the binary content and MIME type of the target image URL.
pub async fn fetch_image(client: &Client, image_url: &str) -> Result<ImagePayload, UploadError> {
    let response = client
        .get(image_url)
        .send()
        .await
        .map_err(|e| UploadError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(UploadError::Fetch(format!(
            "image fetch returned HTTP {}",
            status.as_u16()
        )));
    }

    let content_type = media_type(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );

    let bytes = response
        .bytes()
        .await
        .map_err(|e| UploadError::Fetch(e.to_string()))?;

    debug!(
        url = image_url,
        size = bytes.len(),
        content_type = %content_type,
        "Fetched source image"
    );

    Ok(ImagePayload {
        bytes: bytes.to_vec(),
        content_type,
    })
}
