use super::{colorize_status, print_parcel_table, CliError, Service, EXIT_SUCCESS};
use tracker_core::{ClientId, CoreError, StoreError};

fn show_client(service: &Service, client: ClientId) -> Result<(), CliError> {
    let parcels = service.list_by_client(client)?;
    println!("client {client} has {} parcel(s)", parcels.len());
    if !parcels.is_empty() {
        print_parcel_table(&parcels);
    }
    Ok(())
}

/// Walk one client through the parcel lifecycle against the configured store.
///
/// Refused operations are printed and the walkthrough continues; storage
/// failures abort it.
pub fn run(service: &Service, client: ClientId) -> Result<u8, CliError> {
    let first = service.register(client, "Baker St 221b")?;
    println!("registered parcel {} for client {client}", first.number);

    service.change_address(first.number, "Privet Dr 4")?;
    println!("parcel {} will go to 'Privet Dr 4'", first.number);

    let status = service.advance_status(first.number)?;
    println!("parcel {} is {}", first.number, colorize_status(status));
    show_client(service, client)?;

    match service.delete(first.number) {
        Err(e @ CoreError::Store(StoreError::InvalidState { .. })) => {
            println!("delete refused: {e}");
        }
        Err(e) => return Err(e.into()),
        Ok(()) => println!("deleted parcel {}", first.number),
    }
    show_client(service, client)?;

    let second = service.register(client, "Elm St 13")?;
    println!("registered parcel {} for client {client}", second.number);
    service.delete(second.number)?;
    println!("deleted parcel {}", second.number);
    show_client(service, client)?;

    Ok(EXIT_SUCCESS)
}
