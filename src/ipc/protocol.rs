//! IPC protocol definitions for extension-daemon communication
//!
//! This module defines the newline-delimited JSON protocol spoken between
//! the browser extension and the daemon over a Unix domain socket. The
//! extension owns the context menus and the OAuth handshake; each menu
//! click arrives here as a single upload command, and the settings page
//! drives the album registry through the connect/disconnect commands.

use serde::{Deserialize, Serialize};

/// Protocol version for future compatibility
pub const PROTOCOL_VERSION: u32 = 1;

/// Socket path for IPC communication
pub const SOCKET_PATH: &str = "/tmp/photoclip.sock";

/// Commands sent from the extension to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Upload a clicked image into a connected album
    #[serde(rename_all = "camelCase")]
    Upload {
        /// Album service type
        album_type: String,
        /// Target album id
        album_id: String,
        /// Display name of the target album
        album_name: String,
        /// URL of the clicked image
        image_url: String,
        /// URL of the page hosting the image
        page_url: String,
        /// Browser tab the click originated from
        tab_id: i64,
    },
    /// List connected albums from the registry (menu construction)
    ListAlbums,
    /// List the account's remote albums (connect dialog)
    ListRemoteAlbums,
    /// Connect an album
    #[serde(rename_all = "camelCase")]
    AddAlbum {
        album_type: String,
        album_id: String,
        album_name: String,
    },
    /// Disconnect an album
    #[serde(rename_all = "camelCase")]
    RemoveAlbum {
        album_type: String,
        album_id: String,
    },
    /// Store a fresh bearer token obtained by the extension
    #[serde(rename_all = "camelCase")]
    SetCredential {
        token: String,
    },
    /// Drop the stored bearer token
    ClearCredential,
    /// Get daemon status and in-flight uploads
    GetStatus,
}

/// Responses sent from the daemon to the extension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    /// Success response
    #[serde(rename_all = "camelCase")]
    Success {
        /// Optional success message
        message: Option<String>,
    },
    /// Error response
    #[serde(rename_all = "camelCase")]
    Error {
        /// Error message, including HTTP status and body where applicable
        error: String,
    },
    /// Status response with daemon state
    #[serde(rename_all = "camelCase")]
    Status {
        /// Protocol version
        version: u32,
        /// Whether the daemon is healthy
        healthy: bool,
        /// Whether this is the first run (settings page should be shown)
        first_run: bool,
        /// Uploads currently in flight (busy indicators)
        uploads: Vec<UploadInfo>,
    },
    /// Connected albums from the registry
    #[serde(rename_all = "camelCase")]
    AlbumList {
        albums: Vec<AlbumInfo>,
    },
    /// Albums available on the remote service
    #[serde(rename_all = "camelCase")]
    RemoteAlbumList {
        albums: Vec<RemoteAlbumInfo>,
    },
}

/// An in-flight upload (for status responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    /// Tab the upload was started from
    pub tab_id: i64,
    /// Target album display name
    pub album_name: String,
    /// Image URL shortened for display
    pub label: String,
}

/// A connected album (for registry responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumInfo {
    pub album_type: String,
    pub album_id: String,
    pub album_name: String,
}

/// An album on the remote service (for the connect dialog)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAlbumInfo {
    pub album_id: String,
    pub album_name: String,
}

/// Parse a JSON command from bytes
pub fn parse_command(data: &[u8]) -> Result<Command, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Serialize a response to JSON bytes
pub fn serialize_response(response: &Response) -> Result<Vec<u8>, serde_json::Error> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n'); // Add newline delimiter
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_command() {
        let json = r#"{"type":"upload","albumType":"picasa","albumId":"100","albumName":"Vacation","imageUrl":"http://example.com/cat.png","pageUrl":"http://example.com/","tabId":7}"#;
        let cmd = parse_command(json.as_bytes()).unwrap();
        match cmd {
            Command::Upload {
                album_type,
                album_id,
                album_name,
                image_url,
                page_url,
                tab_id,
            } => {
                assert_eq!(album_type, "picasa");
                assert_eq!(album_id, "100");
                assert_eq!(album_name, "Vacation");
                assert_eq!(image_url, "http://example.com/cat.png");
                assert_eq!(page_url, "http://example.com/");
                assert_eq!(tab_id, 7);
            }
            _ => panic!("Expected Upload command"),
        }
    }

    #[test]
    fn test_parse_add_album_command() {
        let json = r#"{"type":"addAlbum","albumType":"picasa","albumId":"200","albumName":"Clipped"}"#;
        let cmd = parse_command(json.as_bytes()).unwrap();
        match cmd {
            Command::AddAlbum {
                album_type,
                album_id,
                album_name,
            } => {
                assert_eq!(album_type, "picasa");
                assert_eq!(album_id, "200");
                assert_eq!(album_name, "Clipped");
            }
            _ => panic!("Expected AddAlbum command"),
        }
    }

    #[test]
    fn test_parse_remove_album_command() {
        let json = r#"{"type":"removeAlbum","albumType":"picasa","albumId":"200"}"#;
        let cmd = parse_command(json.as_bytes()).unwrap();
        match cmd {
            Command::RemoveAlbum {
                album_type,
                album_id,
            } => {
                assert_eq!(album_type, "picasa");
                assert_eq!(album_id, "200");
            }
            _ => panic!("Expected RemoveAlbum command"),
        }
    }

    #[test]
    fn test_parse_set_credential_command() {
        let json = r#"{"type":"setCredential","token":"ya29.abc"}"#;
        let cmd = parse_command(json.as_bytes()).unwrap();
        match cmd {
            Command::SetCredential { token } => assert_eq!(token, "ya29.abc"),
            _ => panic!("Expected SetCredential command"),
        }
    }

    #[test]
    fn test_parse_get_status_command() {
        let json = r#"{"type":"getStatus"}"#;
        let cmd = parse_command(json.as_bytes()).unwrap();
        match cmd {
            Command::GetStatus => {}
            _ => panic!("Expected GetStatus command"),
        }
    }

    #[test]
    fn test_serialize_success_response() {
        let response = Response::Success {
            message: Some("Uploaded".to_string()),
        };
        let json = serialize_response(&response).unwrap();
        let json_str = String::from_utf8(json).unwrap();
        assert!(json_str.contains("success"));
        assert!(json_str.contains("Uploaded"));
        assert!(json_str.ends_with('\n'));
    }

    #[test]
    fn test_serialize_error_response() {
        let response = Response::Error {
            error: "Upload rejected: response status = 403".to_string(),
        };
        let json = serialize_response(&response).unwrap();
        let json_str = String::from_utf8(json).unwrap();
        assert!(json_str.contains("error"));
        assert!(json_str.contains("403"));
    }

    #[test]
    fn test_serialize_status_response() {
        let response = Response::Status {
            version: PROTOCOL_VERSION,
            healthy: true,
            first_run: false,
            uploads: vec![UploadInfo {
                tab_id: 7,
                album_name: "Vacation".to_string(),
                label: "http://example.com/cat.png".to_string(),
            }],
        };
        let json = serialize_response(&response).unwrap();
        let json_str = String::from_utf8(json).unwrap();
        assert!(json_str.contains("status"));
        assert!(json_str.contains("firstRun"));
        assert!(json_str.contains("tabId"));
        assert!(json_str.contains("Vacation"));
    }

    #[test]
    fn test_serialize_album_list_response() {
        let response = Response::AlbumList {
            albums: vec![AlbumInfo {
                album_type: "picasa".to_string(),
                album_id: "100".to_string(),
                album_name: "Vacation".to_string(),
            }],
        };
        let json = serialize_response(&response).unwrap();
        let json_str = String::from_utf8(json).unwrap();
        assert!(json_str.contains("albumList"));
        assert!(json_str.contains("albumType"));
        assert!(json_str.contains("100"));
    }
}
