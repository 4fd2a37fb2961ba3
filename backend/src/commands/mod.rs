//! Commands exposed to callers of the catalog
//!
//! This module organizes commands into logical submodules:
//! - `records`: Record viewing, editing and search
//! - `tags`: Tag vocabulary operations
//! - `users`: User preferences
//! - `admin`: Bulk import, color updates and deletion
//!
//! All commands follow the pattern:
//! - Take AppState as first parameter
//! - Accept raw caller input (term maps, JSON payloads, ids)
//! - Return Result<T, AppError>, which `CommandOutcome` turns into a response

pub mod admin;
pub mod records;
pub mod tags;
pub mod users;

pub use admin::*;
pub use records::*;
pub use tags::*;
pub use users::*;

use crate::error::{AppError, ErrorKind, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Response status reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    NotFound,
    BadRequest,
    Conflict,
    Unprocessable,
    Unavailable,
    Error,
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::InvalidArgument => Status::BadRequest,
            ErrorKind::Conflict => Status::Conflict,
            ErrorKind::ParseFailure => Status::Unprocessable,
            ErrorKind::UpstreamUnavailable => Status::Unavailable,
            ErrorKind::Internal => Status::Error,
        }
    }
}

/// Structured result of a command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> CommandOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl<T> From<Result<T>> for CommandOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => CommandOutcome {
                status: Status::Ok,
                data: Some(data),
                message: None,
            },
            Err(e) => {
                let status = Status::from(e.kind());
                if status == Status::Error {
                    tracing::error!("Command failed: {}", e);
                } else {
                    tracing::debug!("Command rejected: {}", e);
                }
                CommandOutcome {
                    status,
                    data: None,
                    message: Some(e.to_string()),
                }
            }
        }
    }
}

/// Require a JSON object payload
pub(crate) fn payload_object(payload: &Value) -> Result<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| AppError::InvalidArgument("Payload must be a JSON object".to_string()))
}
