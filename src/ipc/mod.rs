//! IPC server for browser extension communication

pub mod protocol;
pub mod server;

pub use protocol::{
    parse_command, serialize_response, Command, Response, UploadInfo, PROTOCOL_VERSION,
    SOCKET_PATH,
};
pub use server::{AppState, IpcServer};
