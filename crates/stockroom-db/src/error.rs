//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CoreError (stockroom-core)                          │
//! │       │                              SQLite Error (sqlx::Error)        │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::code() → ErrorCode ← What the front end switches on          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule refused the operation. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate barcode
    /// - Creating a location whose name is taken
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Hard-deleting a product that sale history still references
    /// - Referencing a non-existent product or location
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The store could not be reached or is busy.
    ///
    /// ## When This Occurs
    /// - Pool acquire timed out or the pool is closed
    /// - SQLite reported the database busy or locked
    /// - File permissions, disk full
    ///
    /// Safe for the caller to retry with backoff; never retried here.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Stable classification of a [`DbError`], for rendering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    InsufficientStock,
    InvalidLocation,
    NotFound,
    BackendUnavailable,
    Conflict,
    Internal,
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DbError::Core(CoreError::InsufficientStock { .. }) => ErrorCode::InsufficientStock,
            DbError::Core(CoreError::InvalidLocation { .. }) => ErrorCode::InvalidLocation,
            DbError::Core(CoreError::NotFound { .. }) | DbError::NotFound { .. } => ErrorCode::NotFound,
            DbError::Core(CoreError::Validation(ValidationError::Duplicate { .. })) => ErrorCode::Conflict,
            DbError::Core(CoreError::Validation(_)) => ErrorCode::Validation,
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => ErrorCode::Conflict,
            DbError::Unavailable(_) => ErrorCode::BackendUnavailable,
            DbError::MigrationFailed(_) | DbError::QueryFailed(_) | DbError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// True for errors a caller may retry unchanged.
    pub fn is_transient(&self) -> bool {
        self.code() == ErrorCode::BackendUnavailable
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Core(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::Unavailable
/// sqlx::Error::Io             → DbError::Unavailable
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "database is locked" / "database table is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("is locked") || msg.contains("busy") {
                    DbError::Unavailable(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::Unavailable("Connection pool timed out".to_string()),

            sqlx::Error::PoolClosed => DbError::Unavailable("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::Unavailable(io.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
