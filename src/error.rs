//! Error types for snapshot building and sync planning.
//!
//! Every failure carries the offending path or raw listing line, since those
//! are the only diagnostic signals available across a remote session.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by snapshot builds, persistence, and planning.
///
/// Builds are fail-fast: the first extraction or session error aborts the
/// whole build and no partial tree is returned.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local path handed to the metadata extractor does not exist.
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A file could not be read while computing its content hash.
    #[error("failed to hash {}: {source}", .path.display())]
    HashComputation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote session failed to execute a command, or the command
    /// exited non-zero.
    #[error("remote command `{command}` failed: {detail}")]
    RemoteConnection { command: String, detail: String },

    /// A remote listing line did not tokenize into the expected columns.
    #[error("malformed listing line under {}: {line:?}", .path.display())]
    RemoteParse { path: PathBuf, line: String },

    /// A persisted snapshot could not be decoded.
    #[error("failed to load snapshot from {target}: {detail}")]
    ConfigLoad { target: String, detail: String },

    /// A precondition violation, e.g. planning against a non-directory root.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem I/O failure outside of hashing (listing, persistence).
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote build was cancelled before completion; the partial tree
    /// is discarded.
    #[error("remote snapshot build cancelled")]
    Cancelled,
}

impl SyncError {
    /// Wrap an I/O error for `path`, preserving `NotFound` as [`SyncError::PathNotFound`].
    pub fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            SyncError::PathNotFound(path.to_path_buf())
        } else {
            SyncError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
