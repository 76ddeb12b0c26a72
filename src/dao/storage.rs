use std::{error::Error, io};

use thiserror::Error;

/// Result alias for key-value backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error raised by key-value backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Storage is disabled or the medium failed.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Medium-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A write would push usage past the configured capacity.
    #[error("storage quota exceeded writing `{key}` ({needed} bytes needed, limit {limit})")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Total bytes the store would hold after the write.
        needed: usize,
        /// Configured capacity in bytes.
        limit: usize,
    },
}

impl BackendError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        BackendError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Storage has been switched off (private browsing, user settings, ...).
    pub fn disabled() -> Self {
        Self::unavailable(
            "storage is disabled".into(),
            io::Error::new(io::ErrorKind::PermissionDenied, "storage disabled"),
        )
    }

    /// Whether this failure is a rejected write rather than an unreachable backend.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded { .. })
    }
}
