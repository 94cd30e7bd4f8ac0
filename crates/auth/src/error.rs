use std::path::PathBuf;
use thiserror::Error;

/// Result type for credential and session operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The credential file could not be read
    #[error("Failed to read credentials from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file is not valid YAML for the expected shape
    #[error("Malformed credentials file: {0}")]
    Malformed(#[from] serde_yaml::Error),

    /// An entry names neither a password nor a password hash
    #[error("User '{0}' has neither password nor password_hash")]
    MissingPassword(String),

    /// A stored hash is not in `sha256$salt$rounds$digest` form
    #[error("Invalid password hash for user '{user}': {reason}")]
    InvalidHash { user: String, reason: String },

    /// No view has this name
    #[error("Unknown view '{0}'")]
    UnknownView(String),

    /// The requested view is not available to the session's role
    #[error("View '{0}' is not available for this role")]
    ViewNotAllowed(String),
}
