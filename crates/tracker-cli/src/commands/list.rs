use super::{json_pretty, print_parcel_table, CliError, Service, EXIT_SUCCESS};
use tracker_core::ClientId;

pub fn run(service: &Service, client: ClientId, json: bool) -> Result<u8, CliError> {
    let parcels = service.list_by_client(client)?;
    if json {
        println!("{}", json_pretty(&parcels)?);
    } else if parcels.is_empty() {
        println!("no parcels for client {client}");
    } else {
        print_parcel_table(&parcels);
    }
    Ok(EXIT_SUCCESS)
}
