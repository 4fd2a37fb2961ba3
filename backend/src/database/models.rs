//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization at the command boundary.

use crate::color::NamedColor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An annotatable image record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: i64,
    /// Stable identifier assigned at import, never reassigned
    pub uid: String,
    /// Image file name, unique across records
    pub source_name: String,
    pub description: Option<String>,
    pub original_url: Option<String>,
    pub magnification: Option<String>,
    pub author: Option<String>,
    pub primary_color: Option<NamedColor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create record request
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    pub uid: String,
    pub source_name: String,
    pub description: Option<String>,
    pub original_url: Option<String>,
    pub magnification: Option<String>,
    pub author: Option<String>,
}

/// A record together with its tags and comments
#[derive(Debug, Clone, Serialize)]
pub struct RecordDetail {
    #[serde(flatten)]
    pub record: Record,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
}

/// Vocabulary entry shared between records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Tag with the number of records referencing it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TagSummary {
    pub id: i64,
    pub name: String,
    pub record_count: i64,
}

/// Free-text comment left by a user on a record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub record_id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Catalog user and their preferences
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// JSON-encoded search request
    pub last_search: Option<String>,
    /// Uid of the last record viewed
    pub last_record: Option<String>,
    pub default_slider_value: String,
    pub default_mode: String,
    pub default_language: String,
}
