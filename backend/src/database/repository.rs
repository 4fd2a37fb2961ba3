//! Repository layer for database operations
//!
//! Plain methods run against the pool. Methods ending in `_tx` run inside a
//! caller-owned transaction so services can compose several steps into one
//! atomic mutation.

use super::models::*;
use super::predicate::Predicate;
use crate::color::NamedColor;
use crate::config::{DEFAULT_LANGUAGE, DEFAULT_MODE, DEFAULT_SLIDER_VALUE};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

/// Writable user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Username,
    LastSearch,
    LastRecord,
    DefaultSliderValue,
    DefaultMode,
    DefaultLanguage,
}

impl UserColumn {
    fn as_sql(self) -> &'static str {
        match self {
            UserColumn::Username => "username",
            UserColumn::LastSearch => "last_search",
            UserColumn::LastRecord => "last_record",
            UserColumn::DefaultSliderValue => "default_slider_value",
            UserColumn::DefaultMode => "default_mode",
            UserColumn::DefaultLanguage => "default_language",
        }
    }
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction for a multi-step mutation
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    // ===== Records =====

    /// Create a new record
    #[cfg(test)]
    pub async fn create_record(&self, req: &NewRecord) -> Result<Record> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO records (uid, source_name, description, description_folded, original_url, magnification, author, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.uid)
        .bind(&req.source_name)
        .bind(&req.description)
        .bind(req.description.as_deref().map(str::to_lowercase))
        .bind(&req.original_url)
        .bind(&req.magnification)
        .bind(&req.author)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created record: {}", record.uid);
        Ok(record)
    }

    /// Insert a record unless one with the same uid exists.
    ///
    /// Returns false when the uid was already present. A clash on
    /// `source_name` with a different uid is reported as a conflict.
    pub async fn insert_record_if_absent(&self, req: &NewRecord) -> Result<bool> {
        let now = Utc::now();

        let rows = sqlx::query(
            r#"
            INSERT INTO records (uid, source_name, description, description_folded, original_url, magnification, author, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(uid) DO NOTHING
            "#,
        )
        .bind(&req.uid)
        .bind(&req.source_name)
        .bind(&req.description)
        .bind(req.description.as_deref().map(str::to_lowercase))
        .bind(&req.original_url)
        .bind(&req.magnification)
        .bind(&req.author)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    pub async fn find_record(&self, uid: &str) -> Result<Option<Record>> {
        let record = sqlx::query_as::<_, Record>("SELECT * FROM records WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Get a record by uid
    pub async fn get_record(&self, uid: &str) -> Result<Record> {
        self.find_record(uid)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(uid.to_string()))
    }

    pub async fn find_record_by_source(&self, source_name: &str) -> Result<Option<Record>> {
        let record = sqlx::query_as::<_, Record>("SELECT * FROM records WHERE source_name = ?")
            .bind(source_name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    pub async fn list_records(&self) -> Result<Vec<Record>> {
        let records = sqlx::query_as::<_, Record>("SELECT * FROM records ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Records matching a predicate, each at most once, in id order
    pub async fn query_records(&self, predicate: &Predicate) -> Result<Vec<Record>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT r.* FROM records r");
        if !predicate.is_always() {
            qb.push(" WHERE ");
            predicate.push_sql(&mut qb);
        }
        qb.push(" ORDER BY r.id");

        let records = qb
            .build_query_as::<Record>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Record with its tags and comments
    pub async fn record_detail(&self, uid: &str) -> Result<RecordDetail> {
        let record = self.get_record(uid).await?;

        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.* FROM tags t
            JOIN record_tags rt ON rt.tag_id = t.id
            WHERE rt.record_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(record.id)
        .fetch_all(&self.pool)
        .await?;

        let comments = self.list_comments(record.id).await?;

        Ok(RecordDetail {
            record,
            tags,
            comments,
        })
    }

    /// Set the primary color of the record with this source name
    pub async fn set_primary_color(&self, source_name: &str, color: NamedColor) -> Result<bool> {
        let rows = sqlx::query(
            "UPDATE records SET primary_color = ?, updated_at = ? WHERE source_name = ?",
        )
        .bind(color)
        .bind(Utc::now())
        .bind(source_name)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    /// Bump `updated_at` and return the record id.
    ///
    /// Being a write, this takes the database write lock, so it goes first
    /// in any transaction that reads before it writes.
    pub async fn touch_record_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        uid: &str,
    ) -> Result<Option<i64>> {
        let id: Option<i64> =
            sqlx::query_scalar("UPDATE records SET updated_at = ? WHERE uid = ? RETURNING id")
                .bind(Utc::now())
                .bind(uid)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(id)
    }

    pub async fn find_record_id_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        uid: &str,
    ) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM records WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(id)
    }

    pub async fn set_author_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record_id: i64,
        author: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE records SET author = ? WHERE id = ?")
            .bind(author)
            .bind(record_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Delete a record; comments and tag links go with it
    pub async fn delete_record_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        tracing::debug!("Deleted record id {} ({} rows)", id, rows);
        Ok(rows > 0)
    }

    pub async fn delete_all_records_tx(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM records")
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows)
    }

    // ===== Tags =====

    /// All tags with their reference counts
    pub async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        let tags = sqlx::query_as::<_, TagSummary>(
            r#"
            SELECT t.id, t.name, COUNT(rt.record_id) AS record_count
            FROM tags t
            LEFT JOIN record_tags rt ON rt.tag_id = t.id
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    #[cfg(test)]
    pub async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Resolve a tag by name, creating it if needed.
    ///
    /// The insert runs first, taking the write lock. A new tag has no
    /// references, so the caller must link it before committing. Returns the
    /// tag and whether it was just created.
    pub async fn find_or_create_tag_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        name: &str,
    ) -> Result<(Tag, bool)> {
        let created = sqlx::query(
            "INSERT INTO tags (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?
        .rows_affected()
            > 0;

        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;

        if created {
            tracing::debug!("Created tag {}: {}", tag.id, name);
        }
        Ok((tag, created))
    }

    pub async fn find_tag_by_name_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        name: &str,
    ) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(tag)
    }

    pub async fn find_tag_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
    ) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(tag)
    }

    /// Link a tag to a record; returns false if the link already existed
    pub async fn link_tag_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record_id: i64,
        tag_id: i64,
    ) -> Result<bool> {
        let rows = sqlx::query(
            "INSERT INTO record_tags (record_id, tag_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(record_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    /// Remove a record's link to a tag; returns false if there was none
    pub async fn unlink_tag_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record_id: i64,
        tag_id: i64,
    ) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM record_tags WHERE record_id = ? AND tag_id = ?")
            .bind(record_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    /// Remove a tag from every record referencing it
    pub async fn unlink_tag_everywhere_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        tag_id: i64,
    ) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM record_tags WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows)
    }

    pub async fn tag_reference_count_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        tag_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM record_tags WHERE tag_id = ?")
            .bind(tag_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(count)
    }

    pub async fn delete_tag_tx(&self, tx: &mut Transaction<'_, Sqlite>, tag_id: i64) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(tag_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        tracing::debug!("Deleted tag id {}", tag_id);
        Ok(rows > 0)
    }

    /// Delete every tag no record references
    pub async fn delete_orphan_tags_tx(&self, tx: &mut Transaction<'_, Sqlite>) -> Result<u64> {
        let rows = sqlx::query(
            "DELETE FROM tags WHERE NOT EXISTS (SELECT 1 FROM record_tags rt WHERE rt.tag_id = tags.id)",
        )
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows > 0 {
            tracing::debug!("Removed {} unreferenced tags", rows);
        }
        Ok(rows)
    }

    /// Records linked to any of the given tags, each once, in id order
    pub async fn records_with_any_tag_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        tag_ids: &[i64],
    ) -> Result<Vec<Record>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT r.* FROM records r WHERE EXISTS (SELECT 1 FROM record_tags rt \
             WHERE rt.record_id = r.id AND rt.tag_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in tag_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")) ORDER BY r.id");

        let records = qb
            .build_query_as::<Record>()
            .fetch_all(&mut **tx)
            .await?;

        Ok(records)
    }

    // ===== Comments =====

    pub async fn insert_comment_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        record_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (record_id, user_id, text, text_folded, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(record_id)
        .bind(user_id)
        .bind(text)
        .bind(text.to_lowercase())
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!("Created comment {} on record id {}", comment.id, record_id);
        Ok(comment)
    }

    pub async fn list_comments(&self, record_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE record_id = ? ORDER BY created_at, id",
        )
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::CommentNotFound(id));
        }

        tracing::debug!("Deleted comment: {}", id);
        Ok(())
    }

    // ===== Users =====

    /// Find a user, creating one with default preferences if needed.
    ///
    /// The insert runs first so the transaction holds the write lock before
    /// reading. Returns the user and whether it was just created.
    pub async fn get_or_create_user_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        username: &str,
    ) -> Result<(User, bool)> {
        let created = sqlx::query(
            r#"
            INSERT INTO users (username, default_slider_value, default_mode, default_language)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(DEFAULT_SLIDER_VALUE)
        .bind(DEFAULT_MODE)
        .bind(DEFAULT_LANGUAGE)
        .execute(&mut **tx)
        .await?
        .rows_affected()
            > 0;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&mut **tx)
            .await?;

        if created {
            tracing::info!("Created user: {}", username);
        }
        Ok((user, created))
    }

    pub async fn set_user_field_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
        column: UserColumn,
        value: Option<&str>,
    ) -> Result<()> {
        let query = format!("UPDATE users SET {} = ? WHERE id = ?", column.as_sql());

        sqlx::query(&query)
            .bind(value)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub async fn get_user_by_id_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user_id: i64,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(user)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Delete a user; their comments go with them
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    pub async fn delete_all_users(&self) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    fn new_record(uid: &str, source: &str, description: &str) -> NewRecord {
        NewRecord {
            uid: uid.to_string(),
            source_name: source.to_string(),
            description: Some(description.to_string()),
            original_url: None,
            magnification: Some("40x".to_string()),
            author: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_record() {
        let repo = create_test_repo().await;

        let record = repo
            .create_record(&new_record("u1", "a.png", "liver"))
            .await
            .unwrap();
        assert_eq!(record.uid, "u1");
        assert!(record.primary_color.is_none());

        let fetched = repo.get_record("u1").await.unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(fetched.magnification.as_deref(), Some("40x"));

        let by_source = repo.find_record_by_source("a.png").await.unwrap().unwrap();
        assert_eq!(by_source.uid, "u1");
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let repo = create_test_repo().await;

        let err = repo.get_record("nope").await.unwrap_err();
        assert!(matches!(err, AppError::RecordNotFound(uid) if uid == "nope"));
    }

    #[tokio::test]
    async fn test_insert_if_absent_skips_existing_uid() {
        let repo = create_test_repo().await;
        let req = new_record("u1", "a.png", "first");

        assert!(repo.insert_record_if_absent(&req).await.unwrap());

        let mut again = req.clone();
        again.description = Some("second".to_string());
        assert!(!repo.insert_record_if_absent(&again).await.unwrap());

        let records = repo.list_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_duplicate_source_is_conflict() {
        let repo = create_test_repo().await;

        repo.create_record(&new_record("u1", "a.png", "x"))
            .await
            .unwrap();
        let err = repo
            .insert_record_if_absent(&new_record("u2", "a.png", "y"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_set_primary_color() {
        let repo = create_test_repo().await;
        repo.create_record(&new_record("u1", "a.png", "x"))
            .await
            .unwrap();

        assert!(repo
            .set_primary_color("a.png", NamedColor::Green)
            .await
            .unwrap());
        assert!(!repo
            .set_primary_color("missing.png", NamedColor::Green)
            .await
            .unwrap());

        let record = repo.get_record("u1").await.unwrap();
        assert_eq!(record.primary_color, Some(NamedColor::Green));
    }

    #[tokio::test]
    async fn test_query_records_deduplicates_joins() {
        let repo = create_test_repo().await;
        let record = repo
            .create_record(&new_record("u1", "a.png", "x"))
            .await
            .unwrap();

        let mut tx = repo.begin().await.unwrap();
        let (user, _) = repo.get_or_create_user_tx(&mut tx, "alice").await.unwrap();
        for text in ["mitosis seen", "more mitosis", "MITOSIS again"] {
            repo.insert_comment_tx(&mut tx, record.id, user.id, text)
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();

        let matches = repo
            .query_records(&Predicate::CommentContains("mitosis".into()))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_find_or_create_tag_reuses_row() {
        let repo = create_test_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let (first, created) = repo.find_or_create_tag_tx(&mut tx, "benign").await.unwrap();
        let (second, created_again) = repo.find_or_create_tag_tx(&mut tx, "benign").await.unwrap();
        let (other_case, _) = repo.find_or_create_tag_tx(&mut tx, "Benign").await.unwrap();
        tx.commit().await.unwrap();

        assert!(created);
        assert!(!created_again);
        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other_case.id);
    }

    #[tokio::test]
    async fn test_link_is_idempotent_and_counted() {
        let repo = create_test_repo().await;
        let record = repo
            .create_record(&new_record("u1", "a.png", "x"))
            .await
            .unwrap();

        let mut tx = repo.begin().await.unwrap();
        let (tag, _) = repo.find_or_create_tag_tx(&mut tx, "t").await.unwrap();
        assert!(repo.link_tag_tx(&mut tx, record.id, tag.id).await.unwrap());
        assert!(!repo.link_tag_tx(&mut tx, record.id, tag.id).await.unwrap());
        assert_eq!(repo.tag_reference_count_tx(&mut tx, tag.id).await.unwrap(), 1);
        tx.commit().await.unwrap();

        let tags = repo.list_tags().await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].record_count, 1);
    }

    #[tokio::test]
    async fn test_rolled_back_tag_is_not_persisted() {
        let repo = create_test_repo().await;

        {
            let mut tx = repo.begin().await.unwrap();
            repo.find_or_create_tag_tx(&mut tx, "draft").await.unwrap();
            // dropped without commit
        }

        assert!(repo.find_tag_by_name("draft").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_record_cascades_comments_and_links() {
        let repo = create_test_repo().await;
        let record = repo
            .create_record(&new_record("u1", "a.png", "x"))
            .await
            .unwrap();

        let mut tx = repo.begin().await.unwrap();
        let (user, _) = repo.get_or_create_user_tx(&mut tx, "bob").await.unwrap();
        repo.insert_comment_tx(&mut tx, record.id, user.id, "hello")
            .await
            .unwrap();
        let (tag, _) = repo.find_or_create_tag_tx(&mut tx, "t").await.unwrap();
        repo.link_tag_tx(&mut tx, record.id, tag.id).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = repo.begin().await.unwrap();
        assert!(repo.delete_record_tx(&mut tx, record.id).await.unwrap());
        assert_eq!(repo.tag_reference_count_tx(&mut tx, tag.id).await.unwrap(), 0);
        assert_eq!(repo.delete_orphan_tags_tx(&mut tx).await.unwrap(), 1);
        tx.commit().await.unwrap();

        assert!(repo.list_comments(record.id).await.unwrap().is_empty());
        assert!(repo.list_tags().await.unwrap().is_empty());
        assert!(repo.find_user("bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_user_defaults() {
        let repo = create_test_repo().await;

        let mut tx = repo.begin().await.unwrap();
        let (user, created) = repo.get_or_create_user_tx(&mut tx, "carol").await.unwrap();
        let (again, created_again) = repo.get_or_create_user_tx(&mut tx, "carol").await.unwrap();
        tx.commit().await.unwrap();

        assert!(created);
        assert!(!created_again);
        assert_eq!(user.id, again.id);
        assert_eq!(user.default_slider_value, "50");
        assert_eq!(user.default_mode, "dark");
        assert_eq!(user.default_language, "de");
        assert!(user.last_search.is_none());
    }
}
