//! Error types for prdesc-cli

use std::path::PathBuf;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
///
/// Patcher errors are printed exactly as the patcher reports them; store and
/// configuration failures are labelled so bad input and a bad environment
/// are easy to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The description or section request itself is unusable
    #[error(transparent)]
    Patch(prdesc_sections::Error),

    /// Fetching, locating, or storing the description failed
    #[error("store: {0}")]
    Store(prdesc_store::Error),

    /// A configuration file could not be read or parsed
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Process exit code: 2 for unusable input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Patch(_) | CliError::User { .. } => 2,
            _ => 1,
        }
    }
}

impl From<prdesc_sections::Error> for CliError {
    fn from(err: prdesc_sections::Error) -> Self {
        Self::Patch(err)
    }
}

impl From<prdesc_store::Error> for CliError {
    fn from(err: prdesc_store::Error) -> Self {
        match err {
            prdesc_store::Error::Patch(inner) => Self::Patch(inner),
            other => Self::Store(other),
        }
    }
}
