use crate::parcel::{timestamp_now, Parcel, ParcelStatus};
use crate::repository::{Gate, ParcelRepository};
use crate::types::{ClientId, ParcelNumber};
use crate::{StorageError, StoreError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    last_number: i64,
    parcels: BTreeMap<ParcelNumber, Parcel>,
}

/// In-memory parcel repository with the same semantics as the SQLite store.
///
/// Can be taken offline, after which every call fails with a transient
/// [`StorageError::Timeout`].
#[derive(Default)]
pub struct MemoryParcelStore {
    state: Mutex<MemoryState>,
    offline: AtomicBool,
}

impl MemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Timeout(Duration::ZERO).into());
        }
        self.state
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("mutex poisoned: {e}")).into())
    }

    fn gated(
        &self,
        number: ParcelNumber,
        required: ParcelStatus,
        apply: impl FnOnce(&mut MemoryState),
    ) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let current = state.parcels.get(&number).map(|p| p.status);
        let gate = match current {
            None => Gate::Missing,
            Some(current) if current == required => {
                apply(&mut *state);
                Gate::Applied
            }
            Some(current) => Gate::Blocked(current),
        };
        gate.into_result(number, required)
    }
}

impl ParcelRepository for MemoryParcelStore {
    fn add(&self, parcel: &Parcel) -> Result<ParcelNumber, StoreError> {
        let mut state = self.state()?;
        state.last_number += 1;
        let number = ParcelNumber::new(state.last_number);
        let created_at = if parcel.created_at.is_empty() {
            timestamp_now()
        } else {
            parcel.created_at.clone()
        };
        state.parcels.insert(
            number,
            Parcel {
                number,
                client: parcel.client,
                status: ParcelStatus::Registered,
                address: parcel.address.clone(),
                created_at,
            },
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> Result<Parcel, StoreError> {
        self.state()?
            .parcels
            .get(&number)
            .cloned()
            .ok_or(StoreError::NotFound(number))
    }

    fn get_by_client(&self, client: ClientId) -> Result<Vec<Parcel>, StoreError> {
        Ok(self
            .state()?
            .parcels
            .values()
            .filter(|p| p.client == client)
            .cloned()
            .collect())
    }

    fn count_by_client(&self, client: ClientId) -> Result<usize, StoreError> {
        Ok(self
            .state()?
            .parcels
            .values()
            .filter(|p| p.client == client)
            .count())
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> Result<(), StoreError> {
        let mut state = self.state()?;
        let parcel = state
            .parcels
            .get_mut(&number)
            .ok_or(StoreError::NotFound(number))?;
        parcel.status = status;
        Ok(())
    }

    fn set_status_if(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
        status: ParcelStatus,
    ) -> Result<(), StoreError> {
        self.gated(number, expected, |state| {
            if let Some(p) = state.parcels.get_mut(&number) {
                p.status = status;
            }
        })
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> Result<(), StoreError> {
        self.gated(number, ParcelStatus::Registered, |state| {
            if let Some(p) = state.parcels.get_mut(&number) {
                address.clone_into(&mut p.address);
            }
        })
    }

    fn delete(&self, number: ParcelNumber) -> Result<(), StoreError> {
        self.gated(number, ParcelStatus::Registered, |state| {
            state.parcels.remove(&number);
        })
    }
}
