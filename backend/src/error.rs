//! Error types for the catalog
//!
//! All errors use thiserror for structured error handling.
//! `AppError::kind` groups them into the categories the command boundary reports.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record not found: id {0}")]
    RecordIdNotFound(i64),

    #[error("Tag not found: id {0}")]
    TagNotFound(i64),

    #[error("Comment not found: id {0}")]
    CommentNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Tags not found: '{0}' or '{1}'")]
    MergeSourcesNotFound(String, String),

    #[error("No records reference tags '{0}' or '{1}'")]
    NothingToMerge(String, String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source unavailable: {0}")]
    Upstream(String),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i64, supported: i64 },
}

/// Coarse error category, independent of which entity or operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    ParseFailure,
    UpstreamUnavailable,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::RecordNotFound(_)
            | AppError::RecordIdNotFound(_)
            | AppError::TagNotFound(_)
            | AppError::CommentNotFound(_)
            | AppError::UserNotFound(_)
            | AppError::MergeSourcesNotFound(..)
            | AppError::NothingToMerge(..) => ErrorKind::NotFound,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Parse(_) => ErrorKind::ParseFailure,
            AppError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::SchemaTooNew { .. } => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Unique constraints on uid, source_name, tag name and username surface here
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::Database(err)
    }
}

impl From<quick_xml::DeError> for AppError {
    fn from(err: quick_xml::DeError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
