use crate::config::TrackerConfig;
use crate::parcel::{timestamp_now, Parcel, ParcelStatus};
use crate::repository::{Gate, ParcelRepository};
use crate::types::{ClientId, ParcelNumber};
use crate::{schema, StorageError, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Params, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const SELECT_COLUMNS: &str = "SELECT number, client, status, address, created_at FROM parcel";

/// SQLite-backed parcel repository.
///
/// Holds a single connection; every call takes it exclusively for its
/// duration. Status-gated writes run as one conditional statement inside an
/// `IMMEDIATE` transaction, so the precondition and the mutation cannot be
/// separated by another writer, even one using a different connection to the
/// same database file.
pub struct SqliteParcelStore {
    conn: Mutex<Connection>,
    busy_timeout: Duration,
}

impl SqliteParcelStore {
    /// Open (creating if needed) the database at `path` and bootstrap the schema.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StorageError> {
        let path = path.as_ref();
        debug!("opening parcel database {}", path.display());
        let conn = Connection::open(path).map_err(StorageError::Database)?;
        Self::from_connection(conn, busy_timeout)
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, StorageError> {
        Self::open(&config.database, config.busy_timeout())
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::Database)?;
        Self::from_connection(conn, TrackerConfig::default().busy_timeout())
    }

    fn from_connection(conn: Connection, busy_timeout: Duration) -> Result<Self, StorageError> {
        conn.busy_timeout(busy_timeout)
            .map_err(StorageError::Database)?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            busy_timeout,
        })
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("connection mutex poisoned: {e}")))?;
        op(&mut conn).map_err(|e| StorageError::from_sqlite(e, self.busy_timeout))
    }

    /// Run `sql` (which must only match rows in the required status) and,
    /// when nothing matched, find out why within the same transaction.
    fn gated_write<P: Params>(
        &self,
        number: ParcelNumber,
        sql: &str,
        params: P,
    ) -> Result<Gate, StorageError> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let affected = tx.execute(sql, params)?;
            let gate = if affected > 0 {
                Gate::Applied
            } else {
                tx.query_row(
                    "SELECT status FROM parcel WHERE number = ?1",
                    params![number],
                    |row| row.get(0),
                )
                .optional()?
                .map_or(Gate::Missing, Gate::Blocked)
            };
            tx.commit()?;
            Ok(gate)
        })
    }
}

impl ParcelRepository for SqliteParcelStore {
    fn add(&self, parcel: &Parcel) -> Result<ParcelNumber, StoreError> {
        let created_at = if parcel.created_at.is_empty() {
            timestamp_now()
        } else {
            parcel.created_at.clone()
        };
        if parcel.status != ParcelStatus::Registered {
            debug!(
                "ignoring caller-supplied status '{}' on insert",
                parcel.status
            );
        }

        let number = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO parcel (client, status, address, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    parcel.client,
                    ParcelStatus::Registered,
                    parcel.address,
                    created_at
                ],
            )?;
            Ok(ParcelNumber::new(conn.last_insert_rowid()))
        })?;
        debug!("inserted parcel {number} for client {}", parcel.client);
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> Result<Parcel, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE number = ?1");
        self.with_conn(|conn| {
            conn.query_row(&sql, params![number], Parcel::from_row)
                .optional()
        })?
        .ok_or(StoreError::NotFound(number))
    }

    fn get_by_client(&self, client: ClientId) -> Result<Vec<Parcel>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE client = ?1 ORDER BY number");
        let parcels = self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![client], Parcel::from_row)?;
            rows.collect::<rusqlite::Result<Vec<Parcel>>>()
        })?;
        debug!("client {client} has {} parcel(s)", parcels.len());
        Ok(parcels)
    }

    fn count_by_client(&self, client: ClientId) -> Result<usize, StoreError> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM parcel WHERE client = ?1",
                params![client],
                |row| row.get(0),
            )
        })?;
        Ok(count as usize)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> Result<(), StoreError> {
        let affected = self.with_conn(|conn| {
            conn.execute(
                "UPDATE parcel SET status = ?1 WHERE number = ?2",
                params![status, number],
            )
        })?;
        if affected == 0 {
            return Err(StoreError::NotFound(number));
        }
        debug!("parcel {number} status set to {status}");
        Ok(())
    }

    fn set_status_if(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
        status: ParcelStatus,
    ) -> Result<(), StoreError> {
        let gate = self.gated_write(
            number,
            "UPDATE parcel SET status = ?1 WHERE number = ?2 AND status = ?3",
            params![status, number, expected],
        )?;
        if let Gate::Blocked(current) = gate {
            warn!("parcel {number} moved to {current} before {expected} -> {status}");
        }
        gate.into_result(number, expected)?;
        debug!("parcel {number} status {expected} -> {status}");
        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> Result<(), StoreError> {
        let gate = self.gated_write(
            number,
            "UPDATE parcel SET address = ?1 WHERE number = ?2 AND status = ?3",
            params![address, number, ParcelStatus::Registered],
        )?;
        if let Gate::Blocked(current) = gate {
            warn!("refusing address change for parcel {number}: status is {current}");
        }
        gate.into_result(number, ParcelStatus::Registered)?;
        debug!("parcel {number} address changed");
        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> Result<(), StoreError> {
        let gate = self.gated_write(
            number,
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2",
            params![number, ParcelStatus::Registered],
        )?;
        if let Gate::Blocked(current) = gate {
            warn!("refusing to delete parcel {number}: status is {current}");
        }
        gate.into_result(number, ParcelStatus::Registered)?;
        debug!("parcel {number} deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(client: i64, address: &str) -> (SqliteParcelStore, ParcelNumber) {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        let n = store
            .add(&Parcel::draft(ClientId::new(client), address))
            .unwrap();
        (store, n)
    }

    #[test]
    fn add_assigns_increasing_numbers() {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        let a = store.add(&Parcel::draft(ClientId::new(1), "a")).unwrap();
        let b = store.add(&Parcel::draft(ClientId::new(1), "b")).unwrap();
        assert!(a.is_assigned());
        assert!(b > a);
    }

    #[test]
    fn add_forces_registered_status() {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        let mut draft = Parcel::draft(ClientId::new(5), "somewhere");
        draft.status = ParcelStatus::Delivered;
        let n = store.add(&draft).unwrap();
        assert_eq!(store.get(n).unwrap().status, ParcelStatus::Registered);
    }

    #[test]
    fn add_stamps_missing_timestamp() {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        let mut draft = Parcel::draft(ClientId::new(5), "somewhere");
        draft.created_at = String::new();
        let n = store.add(&draft).unwrap();
        let stored = store.get(n).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.created_at).is_ok());
    }

    #[test]
    fn numbers_are_not_reused_after_delete() {
        let (store, first) = store_with(1, "a");
        store.delete(first).unwrap();
        let second = store.add(&Parcel::draft(ClientId::new(1), "b")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn set_status_on_missing_parcel_is_not_found() {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        let err = store
            .set_status(ParcelNumber::new(404), ParcelStatus::Sent)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(n) if n.get() == 404));
    }

    #[test]
    fn set_status_is_unconditional() {
        let (store, n) = store_with(1, "a");
        store.set_status(n, ParcelStatus::Delivered).unwrap();
        store.set_status(n, ParcelStatus::Registered).unwrap();
        assert_eq!(store.get(n).unwrap().status, ParcelStatus::Registered);
    }

    #[test]
    fn set_status_if_writes_only_from_expected_status() {
        let (store, n) = store_with(1, "a");
        store
            .set_status_if(n, ParcelStatus::Registered, ParcelStatus::Sent)
            .unwrap();
        assert_eq!(store.get(n).unwrap().status, ParcelStatus::Sent);

        let err = store
            .set_status_if(n, ParcelStatus::Registered, ParcelStatus::Sent)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidState {
                current: ParcelStatus::Sent,
                required: ParcelStatus::Registered,
                ..
            }
        ));
        let missing = ParcelNumber::new(404);
        assert!(matches!(
            store.set_status_if(missing, ParcelStatus::Sent, ParcelStatus::Delivered),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn blocked_address_change_reports_current_status() {
        let (store, n) = store_with(1, "a");
        store.set_status(n, ParcelStatus::Sent).unwrap();
        let err = store.set_address(n, "b").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidState {
                current: ParcelStatus::Sent,
                required: ParcelStatus::Registered,
                ..
            }
        ));
        assert_eq!(store.get(n).unwrap().address, "a");
    }

    #[test]
    fn corrupt_status_surfaces_as_storage_error() {
        let store = SqliteParcelStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "PRAGMA ignore_check_constraints = ON;
                     INSERT INTO parcel (client, status, address, created_at)
                     VALUES (1, 'lost', 'a', '2024-01-01T00:00:00Z');",
                )
            })
            .unwrap();
        let err = store.get(ParcelNumber::new(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Storage(StorageError::CorruptRow(_))
        ));
    }
}
