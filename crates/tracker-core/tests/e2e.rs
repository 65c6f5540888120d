//! End-to-end workflows through `ParcelService` over an on-disk SQLite store.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracker_core::{ClientId, CoreError, ParcelService, ParcelStatus, StoreError};
use tracker_store::SqliteParcelStore;

fn service_in(dir: &tempfile::TempDir) -> ParcelService<SqliteParcelStore> {
    let store =
        SqliteParcelStore::open(dir.path().join("tracker.db"), Duration::from_secs(5)).unwrap();
    ParcelService::new(store)
}

// register → change address → advance → failed delete → list
#[test]
fn register_change_advance_delete_list() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service_in(&dir);
    let client = ClientId::new(1);

    let parcel = svc.register(client, "A").unwrap();

    svc.change_address(parcel.number, "B").unwrap();
    assert_eq!(svc.get(parcel.number).unwrap().status, ParcelStatus::Registered);

    assert_eq!(svc.advance_status(parcel.number).unwrap(), ParcelStatus::Sent);

    let err = svc.delete(parcel.number).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Store(StoreError::InvalidState {
            current: ParcelStatus::Sent,
            required: ParcelStatus::Registered,
            ..
        })
    ));

    let parcels = svc.list_by_client(client).unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].number, parcel.number);
    assert_eq!(parcels[0].address, "B");
    assert_eq!(parcels[0].status, ParcelStatus::Sent);
    assert_eq!(parcels[0].created_at, parcel.created_at);
}

#[test]
fn advance_three_times_ends_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service_in(&dir);
    let parcel = svc.register(ClientId::new(2), "A").unwrap();

    assert_eq!(svc.advance_status(parcel.number).unwrap(), ParcelStatus::Sent);
    assert_eq!(svc.advance_status(parcel.number).unwrap(), ParcelStatus::Delivered);
    assert_eq!(svc.advance_status(parcel.number).unwrap(), ParcelStatus::Delivered);
}

#[test]
fn registered_parcel_can_be_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service_in(&dir);
    let client = ClientId::new(3);

    let kept = svc.register(client, "A").unwrap();
    svc.advance_status(kept.number).unwrap();
    let dropped = svc.register(client, "A").unwrap();

    svc.delete(dropped.number).unwrap();

    let remaining: Vec<_> = svc
        .list_by_client(client)
        .unwrap()
        .into_iter()
        .map(|p| p.number)
        .collect();
    assert_eq!(remaining, vec![kept.number]);
    assert!(matches!(
        svc.delete(dropped.number),
        Err(CoreError::Store(StoreError::NotFound(_)))
    ));
}

#[test]
fn clients_see_only_their_own_parcels() {
    let dir = tempfile::tempdir().unwrap();
    let svc = service_in(&dir);
    let mut rng = StdRng::seed_from_u64(0x5EED);

    let a = ClientId::new(rng.random_range(1..5_000_000));
    let b = ClientId::new(rng.random_range(5_000_000..10_000_000));
    for _ in 0..2 {
        svc.register(a, "a-street").unwrap();
    }
    svc.register(b, "b-street").unwrap();

    assert!(svc.list_by_client(a).unwrap().iter().all(|p| p.client == a));
    assert_eq!(svc.count_by_client(a).unwrap(), 2);
    assert_eq!(svc.count_by_client(b).unwrap(), 1);
    assert!(svc.list_by_client(ClientId::new(0)).unwrap().is_empty());
}
