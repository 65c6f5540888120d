use super::{json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::ParcelNumber;

pub fn run(service: &Service, number: ParcelNumber, json: bool) -> Result<u8, CliError> {
    service.delete(number)?;
    if json {
        let payload = serde_json::json!({ "number": number, "deleted": true });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("deleted parcel {number}");
    }
    Ok(EXIT_SUCCESS)
}
