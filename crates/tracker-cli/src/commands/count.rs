use super::{json_pretty, CliError, Service, EXIT_SUCCESS};
use tracker_core::ClientId;

pub fn run(service: &Service, client: ClientId, json: bool) -> Result<u8, CliError> {
    let count = service.count_by_client(client)?;
    if json {
        let payload = serde_json::json!({ "client": client, "count": count });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{count}");
    }
    Ok(EXIT_SUCCESS)
}
