//! Upload pipeline error types
//!
//! Maps album service responses to the error the user ultimately sees.
//! Every variant is terminal for the upload that produced it; nothing here
//! is retried, and the message text carries the HTTP status and raw
//! response body for the failure alert.

/// Upload pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Could not fetch source image: {0}")]
    Fetch(String),

    #[error("No credential available; authorize the account and retry")]
    NoCredential,

    #[error("Authorization expired (response status = 401, response body = \"{0}\")")]
    AuthExpired(String),

    #[error("Upload rejected: response status = {status}, response body = \"{body}\"")]
    UploadRejected { status: u16, body: String },

    #[error("Description update rejected: response status = {status}, response body = \"{body}\"")]
    PatchRejected { status: u16, body: String },

    #[error("Unexpected create-photo response: {0}")]
    BadResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl UploadError {
    /// Classify a non-2xx create-photo response
    pub fn from_create_status(status: u16, body: String) -> Self {
        match status {
            401 => UploadError::AuthExpired(body),
            _ => UploadError::UploadRejected { status, body },
        }
    }

    /// Classify a non-2xx description-patch response
    pub fn from_patch_status(status: u16, body: String) -> Self {
        match status {
            401 => UploadError::AuthExpired(body),
            _ => UploadError::PatchRejected { status, body },
        }
    }

    /// Whether the cached credential must be dropped so the next attempt
    /// re-authorizes
    pub fn is_auth(&self) -> bool {
        matches!(self, UploadError::AuthExpired(_) | UploadError::NoCredential)
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Network(err.to_string())
    }
}
