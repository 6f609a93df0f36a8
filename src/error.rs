//! Error taxonomy for the time tracking core.
//!
//! Every business-rule violation maps to exactly one variant so callers can
//! render a specific message (or transport status) without string matching.
//! Storage failures carry the underlying SQLite error and are never retried
//! here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not authenticated: no known user in request context")]
    Unauthenticated,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("user already has an active timer '{timer_id}' on task '{task}'")]
    ConflictActiveTimer { timer_id: String, task: String },

    #[error("timer '{timer_id}' is already stopped")]
    AlreadyStopped { timer_id: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Stable, payload-free classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    PermissionDenied,
    NotFound,
    ConflictActiveTimer,
    AlreadyStopped,
    Validation,
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConflictActiveTimer { .. } => ErrorKind::ConflictActiveTimer,
            Self::AlreadyStopped { .. } => ErrorKind::AlreadyStopped,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
