//! Error types shared by the file-backed storage implementation.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenient result alias returning [`FileDaoError`] failures.
pub type FileResult<T> = Result<T, FileDaoError>;

/// Failures that can occur while interacting with the storage directory.
#[derive(Debug, Error)]
pub enum FileDaoError {
    /// The storage directory could not be created.
    #[error("failed to create storage directory `{path}`")]
    CreateDir {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configured storage path exists but is not a directory.
    #[error("storage path `{path}` is not a directory")]
    NotADirectory {
        /// Configured storage path.
        path: PathBuf,
    },
    /// Listing the storage directory failed.
    #[error("failed to list storage directory `{path}`")]
    ListDir {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Reading a stored value failed.
    #[error("failed to read `{path}`")]
    Read {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing or replacing a stored value failed.
    #[error("failed to write `{path}`")]
    Write {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Deleting a stored value failed.
    #[error("failed to remove `{path}`")]
    Remove {
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The key cannot be mapped onto a file name.
    #[error("invalid storage key `{key}`: only ASCII letters, digits, `-`, `_` and `.` are allowed")]
    InvalidKey {
        /// Rejected key.
        key: String,
    },
}
