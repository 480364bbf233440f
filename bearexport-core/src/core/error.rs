//! Error types for the Bear Export core library.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors that can abort an export run.
///
/// Recoverable problems (a referenced attachment that is missing on disk) are
/// not represented here; they are appended to the run's error list instead.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A SQLite operation failed, including reading or decoding a note row.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The source root does not contain Bear's database at the expected path.
    #[error("Source database not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The database opened but does not look like a Bear database.
    #[error("Invalid source database: {0}")]
    InvalidSource(String),

    /// The destination root is missing or is not a directory.
    #[error("Destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    /// A note's JSON document could not be written to the destination.
    #[error("Failed to write {}: {source}", path.display())]
    WriteNote {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A note could not be encoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`ExportError`].
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Could not read the Bear database: {e}"),
            Self::SourceNotFound(_) => {
                "The selected folder is not Bear's data directory".to_string()
            }
            Self::InvalidSource(msg) => format!("Unsupported Bear database: {msg}"),
            Self::DestinationNotDirectory(path) => {
                format!("{} is not a folder", path.display())
            }
            Self::WriteNote { path, source } => {
                format!("Failed to write {}: {source}", path.display())
            }
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
