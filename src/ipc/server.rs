//! IPC Server - Unix socket server for extension communication
//!
//! Handles incoming connections from the browser extension and dispatches
//! commands to the upload manager, album registry, and credential store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::auth::TokenStore;
use crate::gdata::AlbumClient;
use crate::ipc::protocol::{
    parse_command, serialize_response, AlbumInfo, Command, RemoteAlbumInfo, Response, UploadInfo,
    PROTOCOL_VERSION, SOCKET_PATH,
};
use crate::registry::AlbumRegistry;
use crate::upload::{UploadContext, UploadManager};

/// Shared daemon state the IPC commands operate on
pub struct AppState {
    /// Upload pipelines and busy tracking
    pub manager: UploadManager,
    /// Album service client (used directly for the connect dialog)
    pub client: AlbumClient,
    /// Persisted album registry; mutations save before acknowledging
    pub registry: Mutex<AlbumRegistry>,
    /// Cached bearer credential
    pub tokens: TokenStore,
}

/// IPC server that listens for commands from the extension
pub struct IpcServer {
    state: Arc<AppState>,
    /// Socket listener
    listener: Option<UnixListener>,
    /// Active connections counter
    connection_count: Arc<RwLock<u32>>,
}

impl IpcServer {
    /// Create a new IPC server
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            listener: None,
            connection_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Start the IPC server
    pub async fn start(&mut self) -> Result<()> {
        // Clean up any existing socket file
        let socket_path = PathBuf::from(SOCKET_PATH);
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context("Failed to remove existing socket file")?;
        }

        // Create the socket listener
        let listener = UnixListener::bind(SOCKET_PATH).context("Failed to bind Unix socket")?;

        info!(socket_path = %SOCKET_PATH, "IPC server started");

        self.listener = Some(listener);
        Ok(())
    }

    /// Run the server loop, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("Server not started")?;

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = Arc::clone(&self.state);
                    let connection_count = Arc::clone(&self.connection_count);

                    // Spawn a new task to handle this connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state, connection_count).await {
                            error!(error = %e, "Connection handler error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Stop the IPC server and clean up
    pub async fn stop(&self) -> Result<()> {
        let socket_path = PathBuf::from(SOCKET_PATH);
        if socket_path.exists() {
            std::fs::remove_file(&socket_path).context("Failed to remove socket file")?;
        }
        info!("IPC server stopped");
        Ok(())
    }

    /// Get the number of active connections
    pub async fn connection_count(&self) -> u32 {
        *self.connection_count.read().await
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: UnixStream,
    state: Arc<AppState>,
    connection_count: Arc<RwLock<u32>>,
) -> Result<()> {
    // Increment connection count
    {
        let mut count = connection_count.write().await;
        *count += 1;
        debug!(count = *count, "New connection");
    }

    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();

    // Read commands line by line (newline-delimited JSON)
    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => {
                // Connection closed
                debug!("Connection closed by client");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                debug!(command = %trimmed, "Received command");

                // Parse and process the command
                match parse_command(trimmed.as_bytes()) {
                    Ok(command) => {
                        let response = process_command(command, &state).await;

                        // Send response
                        match serialize_response(&response) {
                            Ok(json) => {
                                if let Err(e) = writer.write_all(&json).await {
                                    error!(error = %e, "Failed to write response");
                                    break;
                                }
                            }
                            Err(e) => {
                                error!(error = %e, "Failed to serialize response");
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, command = %trimmed, "Failed to parse command");
                        let error_response = Response::Error {
                            error: format!("Invalid command: {}", e),
                        };
                        if let Ok(json) = serialize_response(&error_response) {
                            let _ = writer.write_all(&json).await;
                        }
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to read from socket");
                break;
            }
        }
    }

    // Decrement connection count
    {
        let mut count = connection_count.write().await;
        *count = count.saturating_sub(1);
        debug!(count = *count, "Connection ended");
    }

    Ok(())
}

/// Process a command and return a response
async fn process_command(command: Command, state: &AppState) -> Response {
    match command {
        Command::Upload {
            album_type,
            album_id,
            album_name,
            image_url,
            page_url,
            tab_id,
        } => {
            info!(
                album = %album_name,
                tab_id = tab_id,
                "Processing upload command"
            );

            let ctx = UploadContext {
                service: album_type,
                album_id,
                album_name: album_name.clone(),
                image_url,
                page_url,
                tab_id,
            };

            // Replies only when the pipeline finishes; the extension blocks
            // on this response and alerts on error.
            match state.manager.upload(ctx).await {
                Ok(photo_id) => Response::Success {
                    message: Some(format!(
                        "Uploaded to '{}' (photo {})",
                        album_name, photo_id
                    )),
                },
                Err(e) => Response::Error {
                    error: e.to_string(),
                },
            }
        }

        Command::ListAlbums => {
            debug!("Processing listAlbums command");

            let registry = state.registry.lock().await;
            let albums: Vec<AlbumInfo> = registry
                .all_albums()
                .into_iter()
                .map(|a| AlbumInfo {
                    album_type: a.service,
                    album_id: a.album_id,
                    album_name: a.album_name,
                })
                .collect();

            Response::AlbumList { albums }
        }

        Command::ListRemoteAlbums => {
            info!("Processing listRemoteAlbums command");

            match state.client.list_albums().await {
                Ok(albums) => Response::RemoteAlbumList {
                    albums: albums
                        .into_iter()
                        .map(|a| RemoteAlbumInfo {
                            album_id: a.album_id,
                            album_name: a.album_name,
                        })
                        .collect(),
                },
                Err(e) => Response::Error {
                    error: e.to_string(),
                },
            }
        }

        Command::AddAlbum {
            album_type,
            album_id,
            album_name,
        } => {
            info!(album = %album_name, "Processing addAlbum command");

            let mut registry = state.registry.lock().await;
            registry.add_album(&album_type, &album_id, &album_name);
            match registry.save() {
                Ok(()) => Response::Success {
                    message: Some(format!("Connected album '{}'", album_name)),
                },
                Err(e) => Response::Error {
                    error: format!("Failed to save registry: {}", e),
                },
            }
        }

        Command::RemoveAlbum {
            album_type,
            album_id,
        } => {
            info!(album_id = %album_id, "Processing removeAlbum command");

            let mut registry = state.registry.lock().await;
            if !registry.remove_album(&album_type, &album_id) {
                return Response::Error {
                    error: format!("Album {} is not connected", album_id),
                };
            }
            match registry.save() {
                Ok(()) => Response::Success {
                    message: Some(format!("Disconnected album {}", album_id)),
                },
                Err(e) => Response::Error {
                    error: format!("Failed to save registry: {}", e),
                },
            }
        }

        Command::SetCredential { token } => {
            info!("Processing setCredential command");
            state.tokens.set(token);
            Response::Success {
                message: Some("Credential stored".to_string()),
            }
        }

        Command::ClearCredential => {
            info!("Processing clearCredential command");
            state.tokens.invalidate();
            Response::Success {
                message: Some("Credential cleared".to_string()),
            }
        }

        Command::GetStatus => {
            debug!("Processing getStatus command");

            let uploads: Vec<UploadInfo> = state
                .manager
                .active()
                .await
                .into_iter()
                .map(|u| UploadInfo {
                    tab_id: u.tab_id,
                    album_name: u.album_name,
                    label: u.label,
                })
                .collect();

            // The first-run flag reads true exactly once; the extension uses
            // it to open the settings page after install.
            let first_run = {
                let mut registry = state.registry.lock().await;
                let first_run = !registry.installed();
                if first_run {
                    registry.mark_installed();
                    if let Err(e) = registry.save() {
                        error!(error = %e, "Failed to persist installed flag");
                    }
                }
                first_run
            };

            Response::Status {
                version: PROTOCOL_VERSION,
                healthy: true,
                first_run,
                uploads,
            }
        }
    }
}
