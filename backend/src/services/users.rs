//! User service
//!
//! Every operation that takes a username finds or creates the user with
//! default preferences, except deletion.

use crate::database::{Repository, User, UserColumn};
use crate::error::{AppError, Result};
use crate::services::search::SearchRequest;
use serde_json::{Map, Value};

/// A single validated change to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserUpdate {
    Username(String),
    LastSearch(Option<String>),
    LastRecord(Option<String>),
    DefaultSliderValue(String),
    DefaultMode(String),
    DefaultLanguage(String),
}

impl UserUpdate {
    /// Validate an update payload keyed by field name.
    pub fn parse_map(fields: &Map<String, Value>) -> Result<Vec<UserUpdate>> {
        if fields.is_empty() {
            return Err(AppError::InvalidArgument(
                "Update payload is empty".to_string(),
            ));
        }

        fields
            .iter()
            .map(|(key, value)| -> Result<UserUpdate> {
                let update = match key.as_str() {
                    "username" => UserUpdate::Username(required_string(key, value)?),
                    "lastSearch" => UserUpdate::LastSearch(nullable_string(key, value)?),
                    "lastRecord" | "lastImage" => {
                        UserUpdate::LastRecord(nullable_string(key, value)?)
                    }
                    "defaultSliderValue" => {
                        UserUpdate::DefaultSliderValue(required_string(key, value)?)
                    }
                    "defaultMode" => UserUpdate::DefaultMode(required_string(key, value)?),
                    "defaultLanguage" => UserUpdate::DefaultLanguage(required_string(key, value)?),
                    other => {
                        tracing::warn!("Unknown field {} in user update", other);
                        return Err(AppError::InvalidArgument(format!(
                            "Unknown field '{}'",
                            other
                        )));
                    }
                };
                Ok(update)
            })
            .collect()
    }

    fn column_and_value(&self) -> (UserColumn, Option<&str>) {
        match self {
            UserUpdate::Username(v) => (UserColumn::Username, Some(v.as_str())),
            UserUpdate::LastSearch(v) => (UserColumn::LastSearch, v.as_deref()),
            UserUpdate::LastRecord(v) => (UserColumn::LastRecord, v.as_deref()),
            UserUpdate::DefaultSliderValue(v) => (UserColumn::DefaultSliderValue, Some(v.as_str())),
            UserUpdate::DefaultMode(v) => (UserColumn::DefaultMode, Some(v.as_str())),
            UserUpdate::DefaultLanguage(v) => (UserColumn::DefaultLanguage, Some(v.as_str())),
        }
    }
}

fn required_string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidArgument(format!("Field '{}' must be a string", key)))
}

fn nullable_string(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(AppError::InvalidArgument(format!(
            "Field '{}' must be a string or null",
            key
        ))),
    }
}

/// Reject empty or whitespace-only usernames
pub fn validate_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidArgument(
            "Username cannot be empty".to_string(),
        ));
    }
    Ok(username)
}

/// Service for managing users and their preferences
#[derive(Clone)]
pub struct UserService {
    repo: Repository,
}

impl UserService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Find a user, creating it with default preferences if needed
    pub async fn get_or_create(&self, username: &str) -> Result<(User, bool)> {
        let username = validate_username(username)?;

        let mut tx = self.repo.begin().await?;
        let result = self.repo.get_or_create_user_tx(&mut tx, username).await?;
        tx.commit().await?;

        Ok(result)
    }

    /// Apply a set of changes to a user, creating it first if needed.
    ///
    /// Renaming onto an existing username is a conflict.
    pub async fn update_user(&self, username: &str, updates: &[UserUpdate]) -> Result<User> {
        let username = validate_username(username)?;
        if updates.is_empty() {
            return Err(AppError::InvalidArgument(
                "Update payload is empty".to_string(),
            ));
        }

        tracing::info!("Updating user: {}", username);

        let mut tx = self.repo.begin().await?;
        let (user, _) = self.repo.get_or_create_user_tx(&mut tx, username).await?;

        for update in updates {
            if let UserUpdate::Username(new_name) = update {
                validate_username(new_name)?;
            }
            let (column, value) = update.column_and_value();
            self.repo
                .set_user_field_tx(&mut tx, user.id, column, value)
                .await?;
        }

        let user = self.repo.get_user_by_id_tx(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("User {} updated successfully", user.username);
        Ok(user)
    }

    /// Store a search as the user's last one and forget their last viewed record
    pub async fn record_search(&self, username: &str, request: &SearchRequest) -> Result<User> {
        let username = validate_username(username)?;
        let serialized = serde_json::to_string(request)?;

        let mut tx = self.repo.begin().await?;
        let (user, _) = self.repo.get_or_create_user_tx(&mut tx, username).await?;
        self.repo
            .set_user_field_tx(&mut tx, user.id, UserColumn::LastSearch, Some(&serialized))
            .await?;
        self.repo
            .set_user_field_tx(&mut tx, user.id, UserColumn::LastRecord, None)
            .await?;
        let user = self.repo.get_user_by_id_tx(&mut tx, user.id).await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Remember the record a user viewed last
    pub async fn record_view(&self, username: &str, uid: &str) -> Result<User> {
        let username = validate_username(username)?;

        let mut tx = self.repo.begin().await?;
        let (user, _) = self.repo.get_or_create_user_tx(&mut tx, username).await?;
        self.repo
            .set_user_field_tx(&mut tx, user.id, UserColumn::LastRecord, Some(uid))
            .await?;
        let user = self.repo.get_user_by_id_tx(&mut tx, user.id).await?;
        tx.commit().await?;

        Ok(user)
    }

    /// The user's last search, if it parses as a search request
    pub async fn last_search(&self, username: &str) -> Result<Option<SearchRequest>> {
        let (user, _) = self.get_or_create(username).await?;

        Ok(user.last_search.as_deref().and_then(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| tracing::warn!("Stored search for {} is unreadable: {}", username, e))
                .ok()
        }))
    }

    pub async fn last_record(&self, username: &str) -> Result<Option<String>> {
        let (user, _) = self.get_or_create(username).await?;
        Ok(user.last_record)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.repo.list_users().await
    }

    /// Delete a user together with all of their comments
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        tracing::info!("Deleting user: {}", username);

        if !self.repo.delete_user(username).await? {
            return Err(AppError::UserNotFound(username.to_string()));
        }

        tracing::info!("User {} deleted successfully", username);
        Ok(())
    }

    pub async fn delete_all_users(&self) -> Result<u64> {
        let removed = self.repo.delete_all_users().await?;
        tracing::info!("Deleted {} users", removed);
        Ok(removed)
    }
}
