use serde::{Deserialize, Serialize};
use std::fmt;

/// A single field-level schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Failure classes reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteErrorKind {
    Network,
    NotFound,
    Validation,
    Conflict,
    Unknown,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::Validation => "validation",
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Discriminated error returned by every remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Conflict, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Validation, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unknown, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote {} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for RemoteError {}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Validation(Vec<FieldViolation>),
    Network(String),
    NotFound(String),
    Conflict(String),
    UnknownType(String),
    PageGone(String),
    Unknown(String),
    Storage(String),
    Serialization(String),
    Configuration(String),
    NoActivePage,
    Superseded(String),
}

impl AppError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldViolation::new(field, reason)])
    }

    /// Fatal errors must never be retried automatically
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::PageGone(_) | AppError::UnknownType(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(violations) => {
                let joined = violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation error: {}", joined)
            }
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::UnknownType(tag) => write!(f, "Unknown page type: {}", tag),
            AppError::PageGone(id) => write!(f, "Page no longer exists: {}", id),
            AppError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::NoActivePage => write!(f, "No page is active"),
            AppError::Superseded(id) => write!(f, "Load of page {} was superseded", id),
        }
    }
}

impl std::error::Error for AppError {}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err.kind {
            RemoteErrorKind::Network => AppError::Network(err.message),
            RemoteErrorKind::NotFound => AppError::NotFound(err.message),
            RemoteErrorKind::Validation => {
                AppError::Validation(vec![FieldViolation::new("remote", err.message)])
            }
            RemoteErrorKind::Conflict => AppError::Conflict(err.message),
            RemoteErrorKind::Unknown => AppError::Unknown(err.message),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
