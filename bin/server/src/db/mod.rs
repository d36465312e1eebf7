//! Postgres implementations of the engine's collaborators.
//!
//! This module provides data access for:
//! - Users and committees (`PgDirectory`)
//! - Workflow templates (`PgTemplateStore`)
//! - Workflow instances with optimistic versioning (`PgWorkflowStore`)
//! - The per-user workflow index (`PgUserWorkflowIndex`)
//! - Submitted documents (`PgDocumentGenerator`)
//! - Notifications (`PgNotifications`)

mod directory;
mod document;
mod index;
mod notification;
mod template;
mod workflow;

pub use directory::PgDirectory;
pub use document::PgDocumentGenerator;
pub use index::PgUserWorkflowIndex;
pub use notification::PgNotifications;
pub use template::PgTemplateStore;
pub use workflow::PgWorkflowStore;

use docflow_core::ParseIdError;
use docflow_directory::DirectoryError;
use docflow_workflow::StoreError;
use std::fmt::Display;
use std::str::FromStr;

/// Builds a decode error for a column that holds an unexpected value.
fn decode_error(what: &str, value: &str, reason: impl Display) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("invalid {what} '{value}': {reason}"),
    )))
}

/// Parses a prefixed ID column.
fn parse_id<T>(what: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = ParseIdError>,
{
    T::from_str(raw).map_err(|e| decode_error(what, raw, e))
}

/// Decodes a JSONB column into a typed value.
fn from_json<T>(what: &str, owner: &str, value: serde_json::Value) -> Result<T, sqlx::Error>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value).map_err(|e| decode_error(what, owner, e))
}

/// Encodes a value for a JSONB column.
fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

fn store_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Decode(reason) => StoreError::Corrupt {
            id: "row".to_string(),
            reason: reason.to_string(),
        },
        other => StoreError::Unavailable {
            reason: other.to_string(),
        },
    }
}

fn directory_error(error: sqlx::Error) -> DirectoryError {
    match error {
        sqlx::Error::Decode(reason) => DirectoryError::CorruptRecord {
            id: "row".to_string(),
            reason: reason.to_string(),
        },
        other => DirectoryError::Unavailable {
            reason: other.to_string(),
        },
    }
}

/// Converts a stored non-negative integer column into an index.
fn to_index(what: &str, owner: &str, value: i32) -> Result<usize, sqlx::Error> {
    usize::try_from(value).map_err(|e| decode_error(what, owner, e))
}
