use crate::lifecycle::{next_status, validate_transition};
use crate::CoreError;
use tracing::{debug, info, warn};
use tracker_store::{ClientId, Parcel, ParcelNumber, ParcelRepository, ParcelStatus, StoreError};

/// Workflow-level parcel operations on top of a [`ParcelRepository`].
///
/// Holds no state of its own. Repository errors pass through as
/// [`CoreError::Store`].
/// Status writes are conditional on the status that was read, so a parcel
/// moved by another writer in between is never moved backwards.
pub struct ParcelService<R> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Register a new parcel for `client` and return it with its assigned number.
    pub fn register(&self, client: ClientId, address: &str) -> Result<Parcel, CoreError> {
        let mut parcel = Parcel::draft(client, address);
        parcel.number = self.repo.add(&parcel)?;

        info!(
            "new parcel {} to address '{}' from client {} registered at {}",
            parcel.number, parcel.address, parcel.client, parcel.created_at
        );
        Ok(parcel)
    }

    pub fn change_address(&self, number: ParcelNumber, address: &str) -> Result<(), CoreError> {
        self.repo.set_address(number, address)?;
        info!("parcel {number} address changed to '{address}'");
        Ok(())
    }

    /// Move the parcel one step along `registered → sent → delivered`.
    ///
    /// Returns the resulting status. A delivered parcel is left untouched.
    pub fn advance_status(&self, number: ParcelNumber) -> Result<ParcelStatus, CoreError> {
        let current = self.repo.get(number)?.status;
        let next = next_status(current);
        if next == current {
            debug!("parcel {number} already {current}; nothing to advance");
            return Ok(current);
        }

        self.compare_and_set(number, current, next)?;
        info!("parcel {number} advanced: {current} -> {next}");
        Ok(next)
    }

    /// Write `status` only if it is a legal forward step from the current one.
    pub fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> Result<(), CoreError> {
        let current = self.repo.get(number)?.status;
        validate_transition(number, current, status)?;
        if current != status {
            self.compare_and_set(number, current, status)?;
            info!("parcel {number} status: {current} -> {status}");
        }
        Ok(())
    }

    /// Write `to` only while the parcel is still `from`.
    ///
    /// Losing to a writer that already reached `to` counts as success; any
    /// other interleaving is an invalid transition from the status found.
    fn compare_and_set(
        &self,
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    ) -> Result<(), CoreError> {
        match self.repo.set_status_if(number, from, to) {
            Err(StoreError::InvalidState { current, .. }) if current == to => {
                debug!("parcel {number} reached {to} through another writer");
                Ok(())
            }
            Err(StoreError::InvalidState { current, .. }) => {
                warn!("parcel {number} moved to {current} while changing {from} -> {to}");
                Err(CoreError::InvalidTransition {
                    number,
                    from: current,
                    to,
                })
            }
            other => other.map_err(CoreError::from),
        }
    }

    pub fn get(&self, number: ParcelNumber) -> Result<Parcel, CoreError> {
        Ok(self.repo.get(number)?)
    }

    pub fn list_by_client(&self, client: ClientId) -> Result<Vec<Parcel>, CoreError> {
        Ok(self.repo.get_by_client(client)?)
    }

    pub fn count_by_client(&self, client: ClientId) -> Result<usize, CoreError> {
        Ok(self.repo.count_by_client(client)?)
    }

    pub fn delete(&self, number: ParcelNumber) -> Result<(), CoreError> {
        self.repo.delete(number)?;
        info!("parcel {number} deleted");
        Ok(())
    }
}
