use crate::types::{ClientId, ParcelNumber};
use chrono::SecondsFormat;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParcelStatus {
    Registered,
    Sent,
    Delivered,
}

impl ParcelStatus {
    pub const ALL: [ParcelStatus; 3] = [
        ParcelStatus::Registered,
        ParcelStatus::Sent,
        ParcelStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParcelStatus::Registered => "registered",
            ParcelStatus::Sent => "sent",
            ParcelStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parcel status '{0}' (expected registered, sent or delivered)")]
pub struct ParseStatusError(pub String);

impl FromStr for ParcelStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(ParcelStatus::Registered),
            "sent" => Ok(ParcelStatus::Sent),
            "delivered" => Ok(ParcelStatus::Delivered),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

impl ToSql for ParcelStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ParcelStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A single tracked parcel, as stored in the `parcel` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parcel {
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    pub address: String,
    /// RFC3339 UTC timestamp, second precision. Set once on creation.
    pub created_at: String,
}

impl Parcel {
    /// Build an unsaved parcel in the `registered` state, stamped with the current time.
    pub fn draft(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: ParcelNumber::UNASSIGNED,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: timestamp_now(),
        }
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            number: row.get("number")?,
            client: row.get("client")?,
            status: row.get("status")?,
            address: row.get("address")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Current UTC time in the sortable textual form stored in `created_at`.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
