//! Error types for prdesc-store

use std::io::ErrorKind;
use std::path::PathBuf;

/// Result type for prdesc-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching, patching, or storing a description.
///
/// `Patch` carries the patcher's error unchanged; every other variant is a
/// problem with the environment rather than with the input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Patch(#[from] prdesc_sections::Error),

    #[error("Could not determine which description to update (tried: {tried})")]
    TargetUnresolved { tried: String },

    #[error("Invalid document identifier {id:?}: {reason}")]
    InvalidDocumentId { id: String, reason: String },

    #[error("Failed to read event payload at {path}: {message}")]
    EventPayload { path: PathBuf, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}: {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock for document {id} was poisoned by a panicking writer")]
    LockPoisoned { id: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from the patcher (bad input) rather than the
    /// environment.
    pub fn is_patch_error(&self) -> bool {
        matches!(self, Error::Patch(_))
    }

    /// Whether retrying the same store operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Io { source, .. } => matches!(
                source.kind(),
                ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
