//! photoclip-daemon - companion daemon for clipping web images into albums
//!
//! The browser extension forwards each context-menu click here; the daemon
//! fetches the image, encodes the upload body, and posts it to the album
//! service, keeping the connected-album registry and the bearer credential
//! between clicks.

mod auth;
mod gdata;
mod ipc;
mod registry;
mod upload;

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use auth::TokenStore;
use gdata::AlbumClient;
use ipc::{AppState, IpcServer};
use registry::{AlbumRegistry, WEB_ALBUM_SERVICE};
use upload::{UploadContext, UploadManager};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Run IPC server mode (default)
    Server,
    /// Upload an image (CLI mode)
    Upload {
        album_id: String,
        image_url: String,
        page_url: String,
    },
    /// List connected albums (CLI mode)
    Albums,
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"photoclip-daemon - Clip web images into remote photo albums

USAGE:
    photoclip-daemon                     # Run IPC server (default)
    photoclip-daemon upload <album_id> <image_url> <page_url>
    photoclip-daemon albums
    photoclip-daemon help

COMMANDS:
    (none)  Run IPC server mode (waits for commands from the extension)
    upload  Upload one image into an album (CLI mode)
    albums  List connected albums from the registry (CLI mode)
    help    Show this help message

EXAMPLES:
    # Run IPC server (default)
    photoclip-daemon

    # Upload an image (CLI mode for testing)
    photoclip-daemon upload 6234298 http://example.com/cat.png http://example.com/

    # List connected albums (CLI mode)
    photoclip-daemon albums

ENVIRONMENT:
    PHOTOCLIP_TOKEN  Bearer token for the album service (CLI mode)
    RUST_LOG         Log level (trace, debug, info, warn, error)

NOTE:
    IPC server mode is the normal operation. The extension pushes the
    OAuth token over the socket; CLI commands are for testing.
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Server);
    }

    match args[1].as_str() {
        "upload" => {
            if args.len() < 5 {
                return Err(anyhow!(
                    "Usage: photoclip-daemon upload <album_id> <image_url> <page_url>"
                ));
            }
            Ok(Command::Upload {
                album_id: args[2].clone(),
                image_url: args[3].clone(),
                page_url: args[4].clone(),
            })
        }
        "albums" => Ok(Command::Albums),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command
    let command = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    match command {
        Command::Server => {
            info!("Starting photoclip daemon in IPC server mode");

            let registry = AlbumRegistry::load(AlbumRegistry::default_path())?;
            if registry.is_empty() {
                info!("No albums connected yet");
            }

            let tokens = TokenStore::from_env();
            let client = AlbumClient::new(tokens.clone())
                .map_err(|e| anyhow!("Failed to create album client: {}", e))?;
            let manager = UploadManager::new(client.clone());

            let state = Arc::new(AppState {
                manager,
                client,
                registry: Mutex::new(registry),
                tokens,
            });

            // Create and start IPC server
            let mut ipc_server = IpcServer::new(Arc::clone(&state));
            if let Err(e) = ipc_server.start().await {
                error!(error = %e, "Failed to start IPC server");
                return Err(e);
            }

            info!("Daemon ready. Waiting for commands from the extension...");

            // Run IPC server in a separate task
            let ipc_handle = tokio::spawn(async move {
                if let Err(e) = ipc_server.run().await {
                    error!(error = %e, "IPC server error");
                }
            });

            // Wait for Ctrl+C
            tokio::signal::ctrl_c().await?;

            let pending = state.manager.active().await;
            if !pending.is_empty() {
                warn!(count = pending.len(), "Shutting down with uploads still in flight");
            }
            ipc_handle.abort();

            info!("Shutdown complete.");
        }
        Command::Upload {
            album_id,
            image_url,
            page_url,
        } => {
            let tokens = TokenStore::from_env();
            if tokens.get().is_none() {
                eprintln!("Error: PHOTOCLIP_TOKEN is not set");
                std::process::exit(1);
            }

            let client = AlbumClient::new(tokens)
                .map_err(|e| anyhow!("Failed to create album client: {}", e))?;
            let manager = UploadManager::new(client);

            let registry = AlbumRegistry::load(AlbumRegistry::default_path())?;
            let album_name = registry
                .album_name(WEB_ALBUM_SERVICE, &album_id)
                .unwrap_or(album_id.as_str())
                .to_string();

            info!(album = %album_name, image_url = %image_url, "Starting upload...");

            match manager
                .upload(UploadContext {
                    service: WEB_ALBUM_SERVICE.to_string(),
                    album_id,
                    album_name,
                    image_url,
                    page_url,
                    tab_id: 0,
                })
                .await
            {
                Ok(photo_id) => {
                    println!("Uploaded photo {}", photo_id);
                }
                Err(e) => {
                    error!(error = %e, "Upload failed");
                    return Err(anyhow!("{}", e));
                }
            }
        }
        Command::Albums => {
            let registry = AlbumRegistry::load(AlbumRegistry::default_path())?;
            let albums = registry.all_albums();
            if albums.is_empty() {
                println!("No albums connected.");
            } else {
                println!("Connected albums:");
                for album in albums {
                    println!(
                        "  {} -> {} (service: {})",
                        album.album_id, album.album_name, album.service
                    );
                }
            }
        }
        Command::Help => {
            print_help();
        }
    }

    Ok(())
}
