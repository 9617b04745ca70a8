//! Error types for the backup engine.
//!
//! The primary error type is `EngineError`. Every variant carries the path
//! that was being touched so that the error text alone is enough for an
//! operator to find the offending item. Errors are never retried: they
//! propagate to the run controller, which records them and still writes the
//! completion record.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a backup run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to list the entries of a directory
    #[error("Failed to list directory {}: {source}", .path.display())]
    ListDirectory { path: PathBuf, source: io::Error },

    /// Failed to read metadata (type, size, mtime) of an entry
    #[error("Failed to read metadata of {}: {source}", .path.display())]
    Metadata { path: PathBuf, source: io::Error },

    /// Failed to remove a file or directory tree from the destination
    #[error("Failed to remove {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },

    /// Failed to copy a file into the destination
    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to create a directory in the destination
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    /// Failed to carry the modification time over to a copied entry
    #[error("Failed to set modification time of {}: {source}", .path.display())]
    SetModified { path: PathBuf, source: io::Error },

    /// Failed to append to the backup log or the error log
    #[error("Failed to write log {}: {source}", .path.display())]
    JournalWrite { path: PathBuf, source: io::Error },

    /// Failed to encode a run record
    #[error("Failed to serialize run record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::ListDirectory { source, .. }
            | Self::Metadata { source, .. }
            | Self::Remove { source, .. }
            | Self::Copy { source, .. }
            | Self::CreateDirectory { source, .. }
            | Self::SetModified { source, .. }
            | Self::JournalWrite { source, .. } => source.raw_os_error(),
            Self::Serialize(_) => None,
        }
    }
}
