//! Error types for pilotrecall.
//!
//! Three families of failure exist: validation errors raised at the input
//! boundary, storage faults raised by the persistence layer, and
//! configuration errors. Missing records are never errors; lookups return
//! `Option`.

use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationError;

/// Every failure a pilotrecall operation can report.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before anything reached storage.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // --- storage ---
    /// The database file could not be opened or created.
    #[error("cannot open recall database {path}: {source}")]
    DatabaseOpen {
        /// Database location.
        path: PathBuf,
        /// What `SQLite` reported.
        #[source]
        source: rusqlite::Error,
    },

    /// A statement against the recall database failed.
    #[error("recall database error: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The schema could not be brought up to date.
    #[error("schema migration failed: {message}")]
    DatabaseMigration {
        /// Why the migration stopped.
        message: String,
    },

    /// The storage backend could not service the request.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored row could not be decoded.
    #[error("corrupt {table} row {id}: {message}")]
    Corrupt {
        /// Table holding the row.
        table: &'static str,
        /// Row identifier.
        id: i64,
        /// What could not be decoded.
        message: String,
    },

    /// The directory for the database could not be created.
    #[error("cannot create data directory {path}: {source}")]
    DirectoryCreate {
        /// Directory that was attempted.
        path: PathBuf,
        /// What the filesystem reported.
        #[source]
        source: std::io::Error,
    },

    /// A list column could not be encoded.
    #[error("cannot encode column: {0}")]
    Json(#[from] serde_json::Error),

    // --- configuration ---
    /// A configuration source could not be read or parsed.
    #[error("cannot load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration parsed but holds an unusable value.
    #[error("bad configuration: {message}")]
    ConfigValidation {
        /// The offending key and why.
        message: String,
    },

    /// An invariant inside pilotrecall did not hold.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// A [`Error::StorageUnavailable`] with the given reason.
    #[must_use]
    pub fn storage_unavailable(reason: impl Into<String>) -> Self {
        Self::StorageUnavailable(reason.into())
    }

    /// An [`Error::Internal`] with the given description.
    #[must_use]
    pub fn internal(what: impl Into<String>) -> Self {
        Self::Internal(what.into())
    }

    /// An [`Error::Corrupt`] for row `id` of `table`.
    #[must_use]
    pub fn corrupt(table: &'static str, id: i64, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            id,
            message: message.into(),
        }
    }

    /// Whether the input was rejected. Nothing was stored in that case.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the persistence layer failed.
    #[must_use]
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::StorageUnavailable(_)
                | Self::Corrupt { .. }
                | Self::DirectoryCreate { .. }
                | Self::Json(_)
        )
    }
}
