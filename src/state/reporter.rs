//! Error-reporting collaborator invoked on every failure the store swallows.

use std::sync::{Mutex, PoisonError};

use tracing::{error, warn};

use crate::error::{StoreError, StoreErrorKind};

/// Receives every failure caught at the leaderboard store boundary.
pub trait ErrorReporter: Send + Sync {
    /// Record `error`; `context` names the operation that swallowed it.
    fn report(&self, error: &StoreError, context: &str);
}

/// Default reporter forwarding failures to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, err: &StoreError, context: &str) {
        match err {
            StoreError::Decode(source) => {
                warn!(context, error = %err, cause = %source, "discarding unreadable leaderboard")
            }
            StoreError::InvalidEntry(_) => warn!(context, error = %err, "rejected leaderboard entry"),
            _ => error!(context, error = %err, "leaderboard operation failed"),
        }
    }
}

/// One captured report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Variant of the reported error.
    pub kind: StoreErrorKind,
    /// Operation that swallowed it.
    pub context: String,
    /// Rendered error message.
    pub message: String,
}

/// Reporter keeping every report in memory, for embedding UIs and tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    /// Reporter with no reports yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reports received so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of reports of the given kind.
    pub fn count(&self, kind: StoreErrorKind) -> usize {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|report| report.kind == kind)
            .count()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &StoreError, context: &str) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Report {
                kind: error.kind(),
                context: context.to_owned(),
                message: error.to_string(),
            });
    }
}
