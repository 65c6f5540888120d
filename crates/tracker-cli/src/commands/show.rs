use super::{colorize_status, json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::ParcelNumber;

pub fn run(service: &Service, number: ParcelNumber, json: bool) -> Result<u8, CliError> {
    let parcel = service.get(number)?;
    if json {
        println!("{}", json_pretty(&parcel)?);
    } else {
        println!("number:      {}", parcel.number);
        println!("client:      {}", parcel.client);
        println!("status:      {}", colorize_status(parcel.status));
        println!("address:     {}", parcel.address);
        println!("created_at:  {}", parcel.created_at);
    }
    Ok(EXIT_SUCCESS)
}
