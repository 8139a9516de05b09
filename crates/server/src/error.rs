//! Error types for asset intake and the static server

use std::net::SocketAddr;
use std::time::Duration;

use shared::RejectReason;
use thiserror::Error;

pub type IntakeResult<T> = Result<T, IntakeError>;
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors from storing an uploaded asset
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid file type '{0}': only .glb and .gltf are accepted")]
    RejectedExtension(String),

    #[error("Unsafe filename '{0}'")]
    UnsafeFilename(String),

    #[error("Failed to write asset: {0}")]
    Write(#[from] std::io::Error),
}

impl IntakeError {
    /// User-facing rejection reason; `None` for infrastructure failures
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            IntakeError::RejectedExtension(_) => Some(RejectReason::InvalidExtension),
            IntakeError::UnsafeFilename(_) => Some(RejectReason::UnsafeFilename),
            IntakeError::Write(_) => None,
        }
    }
}

/// Errors from starting the static asset server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server on {addr} did not accept connections within {timeout:?}")]
    NotReady { addr: SocketAddr, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from publishing on the selection channel
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selection message has an empty object id")]
    EmptyObjectId,
}
