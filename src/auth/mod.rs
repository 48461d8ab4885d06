//! Credential storage
//!
//! The daemon never acquires tokens itself: the extension performs the OAuth
//! handshake and pushes the resulting bearer token over IPC, and CLI mode
//! seeds it from the environment. The token is opaque here; it is only ever
//! copied verbatim into `Authorization` headers. On an auth failure the
//! stored value is dropped, which forces the next upload to re-authorize.

use std::sync::{Arc, RwLock};

use tracing::debug;

/// Environment variable consulted by `from_env` (CLI mode)
pub const TOKEN_ENV: &str = "PHOTOCLIP_TOKEN";

/// Shared cache for the bearer credential (refreshable, invalidated on 401)
#[derive(Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from `PHOTOCLIP_TOKEN`, if set
    pub fn from_env() -> Self {
        let store = Self::new();
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                store.set(token);
            }
        }
        store
    }

    /// Store a fresh bearer token
    pub fn set(&self, token: String) {
        *self.token.write().unwrap() = Some(token);
        debug!("Stored bearer credential");
    }

    /// Current token, if any
    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    /// Drop the stored token so the next attempt must re-authorize
    pub fn invalidate(&self) {
        *self.token.write().unwrap() = None;
        debug!("Invalidated bearer credential");
    }
}
