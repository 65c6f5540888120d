use super::{json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::ClientId;

pub fn run(service: &Service, client: ClientId, address: &str, json: bool) -> Result<u8, CliError> {
    let parcel = service.register(client, address)?;
    if json {
        println!("{}", json_pretty(&parcel)?);
    } else {
        println!(
            "registered parcel {} for client {} at {}",
            parcel.number, parcel.client, parcel.created_at
        );
        println!("address: {}", parcel.address);
    }
    Ok(EXIT_SUCCESS)
}
