//! Record-related commands
//!
//! Viewing, editing and searching records.

use super::payload_object;
use crate::app::AppState;
use crate::database::{Record, RecordDetail};
use crate::error::Result;
use crate::services::{RecordUpdate, SearchRequest};
use serde_json::Value;
use std::collections::HashMap;

/// Search records on behalf of a user
pub async fn search_records(
    state: &AppState,
    username: &str,
    terms: &HashMap<String, String>,
) -> Result<Vec<Record>> {
    let request = SearchRequest::from_terms(terms);
    state.search.search(username, &request).await
}

/// List every record
pub async fn list_records(state: &AppState) -> Result<Vec<Record>> {
    state.records.list_records().await
}

/// Get a record with its tags and comments
pub async fn get_record(state: &AppState, uid: &str) -> Result<RecordDetail> {
    state.records.get_record(uid).await
}

/// Get a record and remember it as the user's last viewed one
pub async fn view_record(state: &AppState, username: &str, uid: &str) -> Result<RecordDetail> {
    state.records.view_record(username, uid).await
}

/// Apply a field-keyed update payload to a record
pub async fn update_record(
    state: &AppState,
    uid: &str,
    username: &str,
    payload: &Value,
) -> Result<RecordDetail> {
    let updates = RecordUpdate::parse_map(payload_object(payload)?)?;
    state.records.update_record(uid, username, &updates).await
}

/// Delete a single comment
pub async fn delete_comment(state: &AppState, id: i64) -> Result<()> {
    state.records.delete_comment(id).await
}
