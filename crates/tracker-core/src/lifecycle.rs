use crate::CoreError;
use tracker_store::{ParcelNumber, ParcelStatus};

/// The status that follows `status` on the fixed forward path.
/// `delivered` is terminal and maps to itself.
pub fn next_status(status: ParcelStatus) -> ParcelStatus {
    match status {
        ParcelStatus::Registered => ParcelStatus::Sent,
        ParcelStatus::Sent | ParcelStatus::Delivered => ParcelStatus::Delivered,
    }
}

pub fn validate_transition(
    number: ParcelNumber,
    from: ParcelStatus,
    to: ParcelStatus,
) -> Result<(), CoreError> {
    let valid = from == to
        || matches!(
            (from, to),
            (ParcelStatus::Registered, ParcelStatus::Sent)
                | (ParcelStatus::Sent, ParcelStatus::Delivered)
        );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { number, from, to })
    }
}
