use crate::parcel::Parcel;
use crate::types::{ClientId, ParcelNumber};
use crate::{ParcelStatus, StoreError};

/// Persistence operations on parcels.
///
/// Implementations enforce the status gates on `set_address` and `delete`
/// atomically with the write itself: the check and the mutation must never be
/// observable as two separate steps.
pub trait ParcelRepository: Send + Sync {
    /// Insert a new parcel and return its store-assigned number.
    ///
    /// The stored status is always `registered`; the caller's `number` and
    /// `status` are ignored.
    fn add(&self, parcel: &Parcel) -> Result<ParcelNumber, StoreError>;

    fn get(&self, number: ParcelNumber) -> Result<Parcel, StoreError>;

    /// All parcels of a client, ordered by number. Empty when the client has none.
    fn get_by_client(&self, client: ClientId) -> Result<Vec<Parcel>, StoreError>;

    fn count_by_client(&self, client: ClientId) -> Result<usize, StoreError>;

    /// Unconditional status write. Transition rules are the caller's concern.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> Result<(), StoreError>;

    /// Write `status` only if the parcel is currently `expected`.
    ///
    /// Fails with `InvalidState { current, required: expected }` when another
    /// writer moved the parcel first.
    fn set_status_if(
        &self,
        number: ParcelNumber,
        expected: ParcelStatus,
        status: ParcelStatus,
    ) -> Result<(), StoreError>;

    /// Change the address; only legal while the parcel is `registered`.
    fn set_address(&self, number: ParcelNumber, address: &str) -> Result<(), StoreError>;

    /// Remove the parcel; only legal while it is `registered`.
    fn delete(&self, number: ParcelNumber) -> Result<(), StoreError>;
}

/// Outcome of a status-gated write, before it is turned into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    Applied,
    Missing,
    Blocked(ParcelStatus),
}

impl Gate {
    pub(crate) fn into_result(
        self,
        number: ParcelNumber,
        required: ParcelStatus,
    ) -> Result<(), StoreError> {
        match self {
            Gate::Applied => Ok(()),
            Gate::Missing => Err(StoreError::NotFound(number)),
            Gate::Blocked(current) => Err(StoreError::InvalidState {
                number,
                current,
                required,
            }),
        }
    }
}
