//! Table bootstrap and schema versioning.
//!
//! The schema version lives in `PRAGMA user_version`. A fresh or unversioned
//! database is stamped with [`SCHEMA_VERSION`]; a database written by a newer
//! build is refused rather than modified.

use crate::StorageError;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version. Incremented on incompatible table changes.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_PARCEL_TABLE: &str = "
CREATE TABLE IF NOT EXISTS parcel (
    number     INTEGER PRIMARY KEY AUTOINCREMENT,
    client     INTEGER NOT NULL,
    status     TEXT    NOT NULL CHECK (status IN ('registered', 'sent', 'delivered')),
    address    TEXT    NOT NULL,
    created_at TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS parcel_client_idx ON parcel (client);
";

pub fn schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Create the `parcel` table if absent and stamp the schema version.
pub fn initialize(conn: &Connection) -> Result<(), StorageError> {
    let found = schema_version(conn).map_err(StorageError::Database)?;
    if found > SCHEMA_VERSION {
        return Err(StorageError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        });
    }

    if found == SCHEMA_VERSION {
        // Nothing to write: opening must not need the write lock.
        debug!("parcel schema v{found} already present");
        return Ok(());
    }

    conn.execute_batch(CREATE_PARCEL_TABLE)
        .map_err(StorageError::Database)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(StorageError::Database)?;
    info!("initialized parcel schema v{SCHEMA_VERSION} (was v{found})");
    Ok(())
}
