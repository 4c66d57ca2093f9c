//! Error types for cabinsurvey.
//!
//! This module defines all error types used throughout the cabinsurvey crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cabinsurvey operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The background database connection has shut down.
    #[error("database connection closed")]
    ConnectionClosed,

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A record key was malformed.
    #[error("invalid key {key} for collection '{collection}'")]
    InvalidKey {
        /// The collection the key was used against.
        collection: &'static str,
        /// The offending key.
        key: i64,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Session Errors ===
    /// The caller has no authenticated session.
    #[error("not logged in; run `cabinsurvey login` first")]
    NotAuthenticated,

    /// The supplied credentials were rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    // === Workflow Errors ===
    /// An operation that needs connectivity was attempted offline.
    #[error("you are currently offline; connect to the internet to {operation}")]
    Offline {
        /// What the caller was trying to do.
        operation: String,
    },

    /// The selected survey does not exist.
    #[error("survey {0} not found")]
    SurveyNotFound(i64),

    /// The selected flight number does not exist.
    #[error("flight number {0} not found")]
    FlightNotFound(i64),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for cabinsurvey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// Unwraps errors raised inside a connection call; the rest mean the
/// connection is gone.
impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(inner) => inner,
            tokio_rusqlite::Error::Close((_, source)) => Self::DatabaseQuery(source),
            _ => Self::ConnectionClosed,
        }
    }
}

impl Error {
    /// Create an offline error for the given operation.
    #[must_use]
    pub fn offline(operation: impl Into<String>) -> Self {
        Self::Offline {
            operation: operation.into(),
        }
    }

    /// Check if this error means the caller must log in first.
    #[must_use]
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// Check if this error was caused by missing connectivity.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }
}
