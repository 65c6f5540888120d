use super::{colorize_status, json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::{ParcelNumber, ParcelStatus};

pub fn run(
    service: &Service,
    number: ParcelNumber,
    status: ParcelStatus,
    json: bool,
) -> Result<u8, CliError> {
    service.set_status(number, status)?;
    if json {
        let payload = serde_json::json!({ "number": number, "status": status });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("parcel {number} is {}", colorize_status(status));
    }
    Ok(EXIT_SUCCESS)
}
