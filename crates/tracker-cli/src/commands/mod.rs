pub mod advance;
pub mod change_address;
pub mod completions;
pub mod count;
pub mod delete;
pub mod demo;
pub mod list;
pub mod man_pages;
pub mod register;
pub mod set_status;
pub mod show;

use thiserror::Error;
use tracker_core::{CoreError, Parcel, ParcelService, ParcelStatus, StoreError};
use tracker_store::{SqliteParcelStore, StorageError};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_STATE: u8 = 3;
pub const EXIT_STORE_ERROR: u8 = 4;

pub type Service = ParcelService<SqliteParcelStore>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    Output(String),
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Core(e.into())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Core(e.into())
    }
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Core(CoreError::Store(StoreError::NotFound(_))) => EXIT_NOT_FOUND,
            CliError::Core(
                CoreError::Store(StoreError::InvalidState { .. })
                | CoreError::InvalidTransition { .. },
            ) => EXIT_INVALID_STATE,
            CliError::Core(CoreError::Store(StoreError::Storage(_))) => EXIT_STORE_ERROR,
            CliError::Output(_) => EXIT_FAILURE,
        }
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Output(format!("JSON serialization failed: {e}")))
}

pub fn colorize_status(status: ParcelStatus) -> String {
    use console::Style;
    let style = match status {
        ParcelStatus::Registered => Style::new().yellow(),
        ParcelStatus::Sent => Style::new().cyan().bold(),
        ParcelStatus::Delivered => Style::new().green(),
    };
    style.apply_to(status.as_str()).to_string()
}

pub fn print_parcel_table(parcels: &[Parcel]) {
    println!(
        "{:<8} {:<10} {:<11} {:<21} ADDRESS",
        "NUMBER", "CLIENT", "STATUS", "CREATED_AT"
    );
    for p in parcels {
        let status = colorize_status(p.status);
        let status = console::pad_str(&status, 11, console::Alignment::Left, None);
        println!(
            "{:<8} {:<10} {} {:<21} {}",
            p.number, p.client, status, p.created_at, p.address
        );
    }
}
