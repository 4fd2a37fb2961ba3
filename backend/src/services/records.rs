//! Record service
//!
//! Record edits, comment handling and administrative deletion.

use crate::database::{Record, RecordDetail, Repository};
use crate::error::{AppError, Result};
use crate::services::tags::normalize_tag_name;
use crate::services::users::{validate_username, UserService};
use serde_json::{Map, Value};

/// A single validated change to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordUpdate {
    SetAuthor(String),
    AddTags(Vec<String>),
    AddComments(Vec<String>),
}

impl RecordUpdate {
    /// Validate an update payload keyed by field name.
    ///
    /// `author` takes a string, `tags` a list of `{"name": ..}` objects and
    /// `comments` a list of `{"text": ..}` objects.
    pub fn parse_map(fields: &Map<String, Value>) -> Result<Vec<RecordUpdate>> {
        if fields.is_empty() {
            return Err(AppError::InvalidArgument(
                "Update payload is empty".to_string(),
            ));
        }

        fields
            .iter()
            .map(|(key, value)| -> Result<RecordUpdate> {
                let update = match key.as_str() {
                    "author" => RecordUpdate::SetAuthor(
                        value
                            .as_str()
                            .ok_or_else(|| {
                                AppError::InvalidArgument(
                                    "Invalid value type for 'author'".to_string(),
                                )
                            })?
                            .to_string(),
                    ),
                    "tags" => RecordUpdate::AddTags(string_fields(key, value, "name")?),
                    "comments" => RecordUpdate::AddComments(string_fields(key, value, "text")?),
                    other => {
                        tracing::warn!("Unknown field {} in record update", other);
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
}

/// Pull a string field out of every object in a list
fn string_fields(key: &str, value: &Value, field: &str) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::InvalidArgument(format!("Invalid value type for '{}'", key)))?;

    items
        .iter()
        .map(|item| {
            item.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::InvalidArgument(format!(
                        "Every entry in '{}' needs a string '{}'",
                        key, field
                    ))
                })
        })
        .collect()
}

/// Service for record edits and deletion
#[derive(Clone)]
pub struct RecordService {
    repo: Repository,
    users: UserService,
}

impl RecordService {
    pub fn new(repo: Repository, users: UserService) -> Self {
        Self { repo, users }
    }

    pub async fn list_records(&self) -> Result<Vec<Record>> {
        self.repo.list_records().await
    }

    /// Record with its tags and comments
    pub async fn get_record(&self, uid: &str) -> Result<RecordDetail> {
        self.repo.record_detail(uid).await
    }

    /// Fetch a record and remember it as the user's last viewed one.
    ///
    /// The user is created with default preferences if needed.
    pub async fn view_record(&self, username: &str, uid: &str) -> Result<RecordDetail> {
        validate_username(username)?;
        let detail = self.repo.record_detail(uid).await?;
        self.users.record_view(username, uid).await?;

        Ok(detail)
    }

    /// Apply a set of edits to a record in one transaction.
    ///
    /// Comments are authored by `username`, which is created if needed.
    pub async fn update_record(
        &self,
        uid: &str,
        username: &str,
        updates: &[RecordUpdate],
    ) -> Result<RecordDetail> {
        if uid.trim().is_empty() {
            return Err(AppError::InvalidArgument("Record uid cannot be empty".to_string()));
        }
        let username = validate_username(username)?;
        if updates.is_empty() {
            return Err(AppError::InvalidArgument(
                "Update payload is empty".to_string(),
            ));
        }

        tracing::info!("Updating record {} for {}", uid, username);

        let mut tx = self.repo.begin().await?;

        let record_id = self
            .repo
            .touch_record_tx(&mut tx, uid)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(uid.to_string()))?;

        for update in updates {
            match update {
                RecordUpdate::SetAuthor(author) => {
                    self.repo.set_author_tx(&mut tx, record_id, author).await?;
                }
                RecordUpdate::AddTags(names) => {
                    for name in names {
                        let name = normalize_tag_name(name)?;
                        let (tag, _) = self.repo.find_or_create_tag_tx(&mut tx, name).await?;
                        self.repo.link_tag_tx(&mut tx, record_id, tag.id).await?;
                    }
                }
                RecordUpdate::AddComments(texts) => {
                    let (user, _) = self.repo.get_or_create_user_tx(&mut tx, username).await?;
                    for text in texts {
                        self.repo
                            .insert_comment_tx(&mut tx, record_id, user.id, text)
                            .await?;
                    }
                }
            }
        }

        tx.commit().await?;

        tracing::info!("Record {} updated successfully", uid);
        self.repo.record_detail(uid).await
    }

    /// Delete a single comment
    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting comment: {}", id);
        self.repo.delete_comment(id).await
    }

    /// Delete a record and any tags only it referenced
    pub async fn delete_record(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting record: {}", id);

        let mut tx = self.repo.begin().await?;

        if !self.repo.delete_record_tx(&mut tx, id).await? {
            return Err(AppError::RecordIdNotFound(id));
        }
        let orphans = self.repo.delete_orphan_tags_tx(&mut tx).await?;

        tx.commit().await?;

        tracing::info!("Record {} deleted, {} tags collected", id, orphans);
        Ok(())
    }

    /// Delete every record, then every tag
    pub async fn delete_all_records(&self) -> Result<u64> {
        let mut tx = self.repo.begin().await?;

        let removed = self.repo.delete_all_records_tx(&mut tx).await?;
        self.repo.delete_orphan_tags_tx(&mut tx).await?;

        tx.commit().await?;

        tracing::info!("Deleted {} records", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, NewRecord};
    use serde_json::json;

    async fn setup(records: &[&str]) -> (RecordService, Repository) {
        let repo = Repository::new(create_memory_pool().await.unwrap());

        for uid in records {
            repo.create_record(&NewRecord {
                uid: uid.to_string(),
                source_name: format!("{}.png", uid),
                description: None,
                original_url: None,
                magnification: None,
                author: None,
            })
            .await
            .unwrap();
        }

        let users = UserService::new(repo.clone());
        (RecordService::new(repo.clone(), users), repo)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_map_builds_variants() {
        let updates = RecordUpdate::parse_map(&object(json!({
            "author": "Dr. Meier",
            "tags": [{ "name": "benign" }, { "name": "liver" }],
            "comments": [{ "text": "looks fine" }],
        })))
        .unwrap();

        assert_eq!(updates.len(), 3);
        assert!(updates.contains(&RecordUpdate::SetAuthor("Dr. Meier".to_string())));
        assert!(updates.contains(&RecordUpdate::AddTags(vec![
            "benign".to_string(),
            "liver".to_string()
        ])));
        assert!(updates.contains(&RecordUpdate::AddComments(vec!["looks fine".to_string()])));
    }

    #[test]
    fn test_parse_map_rejects_bad_payloads() {
        let cases = [
            json!({}),
            json!({ "title": "x" }),
            json!({ "author": 5 }),
            json!({ "tags": "benign" }),
            json!({ "tags": [{ "label": "benign" }] }),
            json!({ "tags": [{ "name": 1 }] }),
            json!({ "comments": [{ "text": null }] }),
        ];

        for case in cases {
            let err = RecordUpdate::parse_map(&object(case.clone())).unwrap_err();
            assert!(
                matches!(err, AppError::InvalidArgument(_)),
                "payload {} should be rejected",
                case
            );
        }
    }

    #[tokio::test]
    async fn test_update_record_applies_everything() {
        let (service, repo) = setup(&["r1"]).await;

        let detail = service
            .update_record(
                "r1",
                "alice",
                &[
                    RecordUpdate::SetAuthor("Dr. Meier".to_string()),
                    RecordUpdate::AddTags(vec!["benign".to_string(), "benign".to_string()]),
                    RecordUpdate::AddComments(vec!["first".to_string(), "second".to_string()]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(detail.record.author.as_deref(), Some("Dr. Meier"));
        assert_eq!(detail.tags.len(), 1);
        assert_eq!(detail.comments.len(), 2);
        assert!(repo.find_user("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let (service, repo) = setup(&["r1"]).await;

        let err = service
            .update_record(
                "r1",
                "alice",
                &[
                    RecordUpdate::AddTags(vec!["benign".to_string()]),
                    RecordUpdate::AddTags(vec!["  ".to_string()]),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));

        assert!(repo.find_tag_by_name("benign").await.unwrap().is_none());
        assert!(service.get_record("r1").await.unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let (service, _repo) = setup(&[]).await;

        let err = service
            .update_record("ghost", "alice", &[RecordUpdate::SetAuthor("x".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecordNotFound(_)));

        let err = service
            .update_record("", "alice", &[RecordUpdate::SetAuthor("x".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_view_record_remembers_uid() {
        let (service, repo) = setup(&["r1"]).await;

        let detail = service.view_record("alice", "r1").await.unwrap();
        assert_eq!(detail.record.uid, "r1");

        let user = repo.find_user("alice").await.unwrap().unwrap();
        assert_eq!(user.last_record.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_view_shares_user_state_with_user_service() {
        let (service, repo) = setup(&["r1", "r2"]).await;
        let users = UserService::new(repo.clone());

        service.view_record("alice", "r1").await.unwrap();
        service.view_record(" alice ", "r2").await.unwrap();
        assert_eq!(users.last_record("alice").await.unwrap().as_deref(), Some("r2"));
        assert_eq!(users.list_users().await.unwrap().len(), 1);

        let err = service.view_record("alice", "missing").await.unwrap_err();
        assert!(matches!(err, AppError::RecordNotFound(_)));
        assert_eq!(users.last_record("alice").await.unwrap().as_deref(), Some("r2"));

        let err = service.view_record("  ", "r1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert_eq!(users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_comment_keeps_siblings() {
        let (service, _repo) = setup(&["r1"]).await;

        let detail = service
            .update_record(
                "r1",
                "alice",
                &[RecordUpdate::AddComments(vec!["a".into(), "b".into()])],
            )
            .await
            .unwrap();
        let doomed = detail.comments[0].id;

        service.delete_comment(doomed).await.unwrap();

        let after = service.get_record("r1").await.unwrap();
        assert_eq!(after.comments.len(), 1);
        assert_eq!(after.comments[0].text, "b");

        let err = service.delete_comment(doomed).await.unwrap_err();
        assert!(matches!(err, AppError::CommentNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_record_collects_its_tags() {
        let (service, repo) = setup(&["r1", "r2"]).await;

        service
            .update_record("r1", "alice", &[RecordUpdate::AddTags(vec!["solo".into(), "shared".into()])])
            .await
            .unwrap();
        service
            .update_record("r2", "alice", &[RecordUpdate::AddTags(vec!["shared".into()])])
            .await
            .unwrap();

        let id = repo.get_record("r1").await.unwrap().id;
        service.delete_record(id).await.unwrap();

        assert!(repo.find_tag_by_name("solo").await.unwrap().is_none());
        assert!(repo.find_tag_by_name("shared").await.unwrap().is_some());

        let err = service.delete_record(id).await.unwrap_err();
        assert!(matches!(err, AppError::RecordIdNotFound(_)));

        assert_eq!(service.delete_all_records().await.unwrap(), 1);
        assert!(repo.list_tags().await.unwrap().is_empty());
    }
}
