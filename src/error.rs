//! Centralized error types for maildepot.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maildepot library.
#[derive(Error, Debug)]
pub enum DepotError {
    /// I/O error with the associated file path.
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The initiating user lacks a capability required for delivery.
    ///
    /// This aborts the whole message: nothing is stored.
    #[error("user '{username}' lacks the '{capability}' capability")]
    PermissionDenied {
        username: String,
        capability: String,
    },

    /// The inbound record references a user id the directory cannot resolve.
    #[error("unknown user id {0}")]
    UnknownUser(u64),

    /// An attachment filename was empty or could not be made storable.
    #[error("invalid filename: '{0}'")]
    InvalidFilename(String),

    /// A file with this name already exists in the target area.
    #[error("file '{0}' already exists in this area")]
    FileExists(String),

    /// The area manifest is corrupt or unreadable.
    #[error("corrupt manifest at '{path}': {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// The raw message could not be parsed as MIME.
    #[error("MIME parsing error: {0}")]
    Mime(String),
}

/// Convenience alias for `Result<T, DepotError>`.
pub type Result<T> = std::result::Result<T, DepotError>;

/// Helper to convert a bare `std::io::Error` together with a path.
impl DepotError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `DepotError`
/// when no path context is available (rare — prefer `DepotError::io`).
impl From<std::io::Error> for DepotError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
