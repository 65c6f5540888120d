//! Parcel workflows for the tracker.
//!
//! This crate ties the storage layer to user-facing operations: the
//! `ParcelService` (register, change address, advance status, list, delete)
//! and the status lifecycle that decides which forward step comes next.

pub mod lifecycle;
pub mod service;

pub use lifecycle::{next_status, validate_transition};
pub use service::ParcelService;
pub use tracker_store::{
    ClientId, Parcel, ParcelNumber, ParcelRepository, ParcelStatus, StorageError, StoreError,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid status transition for parcel {number}: {from} -> {to}")]
    InvalidTransition {
        number: ParcelNumber,
        from: ParcelStatus,
        to: ParcelStatus,
    },
}

impl CoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Store(e) if e.is_transient())
    }
}

impl From<StorageError> for CoreError {
    fn from(e: StorageError) -> Self {
        CoreError::Store(e.into())
    }
}
