use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;
use validator::ValidationErrors;

use crate::dao::{codec::DecodeError, storage::BackendError};

/// Failures of a leaderboard operation, caught at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage is disabled or cannot be reached.
    #[error("storage backend unavailable")]
    BackendUnavailable(#[source] BackendError),
    /// The backend rejected a write for lack of space.
    #[error("storage quota exceeded")]
    QuotaExceeded(#[source] BackendError),
    /// The stored leaderboard is corrupt.
    #[error("stored leaderboard could not be decoded")]
    Decode(#[from] DecodeError),
    /// Another writer holds the advisory lock; retried, never reported.
    #[error("leaderboard lock is held by another writer")]
    LockContended,
    /// The submitted entry breaks the data model (empty name).
    #[error("invalid leaderboard entry: {0}")]
    InvalidEntry(ValidationErrors),
}

/// Fieldless mirror of [`StoreError`] for matching and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// See [`StoreError::BackendUnavailable`].
    BackendUnavailable,
    /// See [`StoreError::QuotaExceeded`].
    QuotaExceeded,
    /// See [`StoreError::Decode`].
    Decode,
    /// See [`StoreError::LockContended`].
    LockContended,
    /// See [`StoreError::InvalidEntry`].
    InvalidEntry,
}

impl StoreError {
    /// Variant of this error without its payload.
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::BackendUnavailable(_) => StoreErrorKind::BackendUnavailable,
            StoreError::QuotaExceeded(_) => StoreErrorKind::QuotaExceeded,
            StoreError::Decode(_) => StoreErrorKind::Decode,
            StoreError::LockContended => StoreErrorKind::LockContended,
            StoreError::InvalidEntry(_) => StoreErrorKind::InvalidEntry,
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        if err.is_quota_exceeded() {
            StoreError::QuotaExceeded(err)
        } else {
            StoreError::BackendUnavailable(err)
        }
    }
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The storage supervisor has put the application in degraded mode.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// A storage task on the blocking pool panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Interrupted(#[from] JoinError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Interrupted(source) => AppError::Internal(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn backend_errors_map_onto_the_taxonomy() {
        let quota: StoreError = BackendError::QuotaExceeded {
            key: "leaderboard".into(),
            needed: 10,
            limit: 5,
        }
        .into();
        assert_eq!(quota.kind(), StoreErrorKind::QuotaExceeded);

        let unavailable: StoreError =
            BackendError::unavailable("io".into(), io::Error::other("boom")).into();
        assert_eq!(unavailable.kind(), StoreErrorKind::BackendUnavailable);
    }

    #[test]
    fn service_errors_pick_http_status() {
        let response = AppError::from(ServiceError::NotFound("Ann".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(ServiceError::InvalidInput("empty".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(ServiceError::Degraded).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
