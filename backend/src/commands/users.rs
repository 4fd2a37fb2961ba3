//! User-related commands
//!
//! Every command taking a username creates the user with default
//! preferences if it does not exist yet, except deletion.

use super::payload_object;
use crate::app::AppState;
use crate::database::User;
use crate::error::Result;
use crate::services::{SearchRequest, UserUpdate};
use serde_json::Value;

pub async fn get_user(state: &AppState, username: &str) -> Result<User> {
    let (user, _) = state.users.get_or_create(username).await?;
    Ok(user)
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    state.users.list_users().await
}

/// Apply a field-keyed update payload to a user
pub async fn update_user(state: &AppState, username: &str, payload: &Value) -> Result<User> {
    let updates = UserUpdate::parse_map(payload_object(payload)?)?;
    state.users.update_user(username, &updates).await
}

pub async fn get_last_search(state: &AppState, username: &str) -> Result<Option<SearchRequest>> {
    state.users.last_search(username).await
}

pub async fn get_last_record(state: &AppState, username: &str) -> Result<Option<String>> {
    state.users.last_record(username).await
}

/// Delete a user and their comments
pub async fn delete_user(state: &AppState, username: &str) -> Result<()> {
    state.users.delete_user(username).await
}
