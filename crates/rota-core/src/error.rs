//! Error types for rota operations.
//!
//! Every failure carries a structured error code so callers (the intent router,
//! the HTTP surface) can decide how to present it without string matching.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias for rota operations.
pub type RotaResult<T> = Result<T, RotaError>;

/// Main error type for all rota operations.
#[derive(Error, Debug)]
pub enum RotaError {
    /// Persistence is unavailable or a store operation failed.
    #[error("Store error: {message}")]
    Store {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Postponing would move an assignment onto an occupied week.
    #[error("Schedule conflict: cannot move {date} onto {occupied_on}, already taken by {occupied_by}")]
    ScheduleConflict {
        date: NaiveDate,
        occupied_on: NaiveDate,
        occupied_by: String,
    },

    /// The user has no assignment on the rotation.
    #[error("Not on rotation: {user}")]
    NotFound { user: String },

    /// The user directory could not be reached.
    #[error("User directory unavailable: {message}")]
    DirectoryUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The NLU classifier failed to classify a message.
    #[error("Classification error: {message}")]
    Classification { message: String },

    /// Message delivery failed.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Store (STORE_xxx)
    StoreUnavailable,
    StoreOperationFailed,
    StoreCorrupted,

    // Schedule (SCHED_xxx)
    ScheduleConflict,
    UserNotOnRotation,

    // Directory (DIR_xxx)
    DirectoryUnavailable,

    // Classifier (NLU_xxx)
    ClassificationFailed,

    // Transport (TRN_xxx)
    TransportFailed,

    // Configuration (CFG_xxx)
    ConfigInvalid,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StoreUnavailable => "STORE_001",
            ErrorCode::StoreOperationFailed => "STORE_002",
            ErrorCode::StoreCorrupted => "STORE_003",
            ErrorCode::ScheduleConflict => "SCHED_001",
            ErrorCode::UserNotOnRotation => "SCHED_002",
            ErrorCode::DirectoryUnavailable => "DIR_001",
            ErrorCode::ClassificationFailed => "NLU_001",
            ErrorCode::TransportFailed => "TRN_001",
            ErrorCode::ConfigInvalid => "CFG_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl RotaError {
    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::StoreOperationFailed,
            source: None,
        }
    }

    /// Create a store error for data that could not be decoded.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            code: ErrorCode::StoreCorrupted,
            source: None,
        }
    }

    /// Create an error for a user with no assignment.
    pub fn not_found(user: impl Into<String>) -> Self {
        Self::NotFound { user: user.into() }
    }

    /// Create a directory error.
    pub fn directory(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a classification error.
    pub fn classification(message: impl Into<String>) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Store { code, .. } => *code,
            Self::ScheduleConflict { .. } => ErrorCode::ScheduleConflict,
            Self::NotFound { .. } => ErrorCode::UserNotOnRotation,
            Self::DirectoryUnavailable { .. } => ErrorCode::DirectoryUnavailable,
            Self::Classification { .. } => ErrorCode::ClassificationFailed,
            Self::Transport { .. } => ErrorCode::TransportFailed,
            Self::Configuration(_) => ErrorCode::ConfigInvalid,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether this error is a schedule conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ScheduleConflict { .. })
    }
}

impl From<rusqlite::Error> for RotaError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                ErrorCode::StoreUnavailable
            }
            _ => ErrorCode::StoreOperationFailed,
        };
        Self::Store {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}
