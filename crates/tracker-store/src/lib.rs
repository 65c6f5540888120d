//! Parcel entity, error taxonomy, and persistence for the parcel tracker.
//!
//! This crate provides the storage layer: the `Parcel` entity and its
//! `ParcelStatus`, the `ParcelRepository` trait that every backend implements,
//! `SqliteParcelStore` (a `rusqlite`-backed repository that enforces the
//! status-gated mutation rules inside single conditional statements),
//! `MemoryParcelStore` for tests, schema bootstrapping, and `TrackerConfig`.

pub mod config;
pub mod memory;
pub mod parcel;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use config::TrackerConfig;
pub use memory::MemoryParcelStore;
pub use parcel::{timestamp_now, Parcel, ParcelStatus, ParseStatusError};
pub use repository::ParcelRepository;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteParcelStore;
pub use types::{ClientId, ParcelNumber};

use rusqlite::ErrorCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parcel not found: {0}")]
    NotFound(ParcelNumber),
    #[error("parcel {number} is {current}; this operation requires status {required}")]
    InvalidState {
        number: ParcelNumber,
        current: ParcelStatus,
        required: ParcelStatus,
    },
    #[error("store error: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Storage(e) if e.is_transient())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// The database stayed busy or locked. Carries the configured busy
    /// timeout, which bounds the wait; SQLite may give up sooner to avoid a
    /// deadlock.
    #[error("store busy or locked (busy timeout {0:?})")]
    Timeout(Duration),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("corrupt parcel row: {0}")]
    CorruptRow(String),
    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: i64, found: i64 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(rusqlite::Error),
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Timeout(_))
    }

    /// Classify an engine error by its SQLite result code.
    ///
    /// `busy_timeout` is the configured upper bound on the wait, reported
    /// back when SQLite gives up on a busy or locked database.
    pub fn from_sqlite(err: rusqlite::Error, busy_timeout: Duration) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                StorageError::Timeout(busy_timeout)
            }
            Some(ErrorCode::ConstraintViolation) => StorageError::Constraint(err.to_string()),
            _ => match err {
                rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::IntegralValueOutOfRange(..) => {
                    StorageError::CorruptRow(err.to_string())
                }
                other => StorageError::Database(other),
            },
        }
    }
}
