use super::{json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::ParcelNumber;

pub fn run(
    service: &Service,
    number: ParcelNumber,
    address: &str,
    json: bool,
) -> Result<u8, CliError> {
    service.change_address(number, address)?;
    if json {
        let payload = serde_json::json!({ "number": number, "address": address });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("parcel {number} will be delivered to '{address}'");
    }
    Ok(EXIT_SUCCESS)
}
