//! Error types for notesync-core

use std::path::PathBuf;

/// Result type for notesync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
///
/// None of these escape an executing plan: operations catch and report their
/// own failures. They surface while item sets are being built or while the
/// configuration is being turned into a factory.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The note provider could not be reached or refused the request
    #[error("Note store error: {message}")]
    Remote { message: String },

    /// A resource's content could not be produced
    #[error("Could not read content for {location}: {message}")]
    Content { location: String, message: String },

    /// A snapshot referenced a file that could not be read
    #[error("Snapshot entry {path} could not be read: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is incomplete or contradictory
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from notesync-fs
    #[error(transparent)]
    Fs(#[from] notesync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }
}
