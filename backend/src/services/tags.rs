//! Tag lifecycle service
//!
//! Owns every mutation of the tag vocabulary and of record/tag links.
//! Each operation runs in a single transaction whose first statement is a
//! write, so concurrent mutations of the same tag are serialised by the
//! database and each one re-reads current state. A tag whose last link is
//! removed is deleted in the same transaction.

use crate::database::{Repository, Tag, TagSummary};
use crate::error::{AppError, Result};
use serde::Serialize;

/// Result of detaching a tag from one record
#[derive(Debug, Clone, Serialize)]
pub struct DetachOutcome {
    /// The record actually carried the tag
    pub unlinked: bool,
    /// The tag lost its last reference and was deleted
    pub tag_deleted: bool,
}

/// Result of merging two tags
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub tag: Tag,
    /// Uids of the records now carrying the merged tag
    pub records: Vec<String>,
}

/// Trim a tag name and reject empty ones. Names are otherwise matched exactly.
pub fn normalize_tag_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidArgument(
            "Tag name cannot be empty".to_string(),
        ));
    }
    Ok(name)
}

/// Service for managing the tag vocabulary
#[derive(Clone)]
pub struct TagService {
    repo: Repository,
}

impl TagService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// All tags with their reference counts
    pub async fn list_tags(&self) -> Result<Vec<TagSummary>> {
        self.repo.list_tags().await
    }

    /// Attach a tag to a record by name, creating the tag on first use.
    ///
    /// Attaching a tag the record already carries is a no-op.
    pub async fn attach(&self, record_uid: &str, tag_name: &str) -> Result<Tag> {
        let name = normalize_tag_name(tag_name)?;

        let mut tx = self.repo.begin().await?;

        let (tag, _) = self.repo.find_or_create_tag_tx(&mut tx, name).await?;
        let record_id = self
            .repo
            .find_record_id_tx(&mut tx, record_uid)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(record_uid.to_string()))?;

        if self.repo.link_tag_tx(&mut tx, record_id, tag.id).await? {
            tracing::info!("Attached tag '{}' to record {}", name, record_uid);
        }

        tx.commit().await?;
        Ok(tag)
    }

    /// Detach a tag from a record, deleting the tag if nothing references it anymore.
    pub async fn detach(&self, record_uid: &str, tag_id: i64) -> Result<DetachOutcome> {
        tracing::info!("Removing tag {} from record {}", tag_id, record_uid);

        let mut tx = self.repo.begin().await?;

        let record_id = self.repo.touch_record_tx(&mut tx, record_uid).await?;
        self.repo
            .find_tag_tx(&mut tx, tag_id)
            .await?
            .ok_or(AppError::TagNotFound(tag_id))?;
        let record_id =
            record_id.ok_or_else(|| AppError::RecordNotFound(record_uid.to_string()))?;

        let unlinked = self.repo.unlink_tag_tx(&mut tx, record_id, tag_id).await?;

        let tag_deleted = if self.repo.tag_reference_count_tx(&mut tx, tag_id).await? == 0 {
            self.repo.delete_tag_tx(&mut tx, tag_id).await?
        } else {
            false
        };

        tx.commit().await?;

        if tag_deleted {
            tracing::info!("Tag {} no longer referenced, deleted", tag_id);
        }
        Ok(DetachOutcome {
            unlinked,
            tag_deleted,
        })
    }

    /// Remove a tag from every record and delete it.
    ///
    /// Returns the number of records the tag was removed from.
    pub async fn purge_everywhere(&self, tag_id: i64) -> Result<u64> {
        tracing::info!("Deleting tag {} from all records", tag_id);

        let mut tx = self.repo.begin().await?;

        let detached = self.repo.unlink_tag_everywhere_tx(&mut tx, tag_id).await?;
        if !self.repo.delete_tag_tx(&mut tx, tag_id).await? {
            return Err(AppError::TagNotFound(tag_id));
        }

        tx.commit().await?;

        tracing::info!("Tag {} removed from {} records and deleted", tag_id, detached);
        Ok(detached)
    }

    /// Replace tags `name_a` and `name_b` with `new_name` on every record carrying either.
    ///
    /// The destination is reused if it already exists and may be one of the
    /// sources. Sources other than the destination are deleted afterwards.
    pub async fn merge(&self, name_a: &str, name_b: &str, new_name: &str) -> Result<MergeOutcome> {
        let name_a = normalize_tag_name(name_a)?;
        let name_b = normalize_tag_name(name_b)?;
        let new_name = normalize_tag_name(new_name)?;

        tracing::info!("Merging tags '{}' and '{}' into '{}'", name_a, name_b, new_name);

        let mut tx = self.repo.begin().await?;

        let (dest, dest_created) = self.repo.find_or_create_tag_tx(&mut tx, new_name).await?;

        // A destination created just now did not exist as a source
        let existing = |tag: Option<Tag>| tag.filter(|t| !(dest_created && t.id == dest.id));
        let source_a = existing(self.repo.find_tag_by_name_tx(&mut tx, name_a).await?);
        let source_b = existing(self.repo.find_tag_by_name_tx(&mut tx, name_b).await?);

        let mut source_ids: Vec<i64> = source_a.iter().chain(source_b.iter()).map(|t| t.id).collect();
        source_ids.dedup();

        if source_ids.is_empty() {
            tracing::warn!("Tags not found: '{}' or '{}'", name_a, name_b);
            return Err(AppError::MergeSourcesNotFound(
                name_a.to_string(),
                name_b.to_string(),
            ));
        }

        let affected = self.repo.records_with_any_tag_tx(&mut tx, &source_ids).await?;
        if affected.is_empty() {
            tracing::warn!("No records carry tags '{}' or '{}'", name_a, name_b);
            return Err(AppError::NothingToMerge(
                name_a.to_string(),
                name_b.to_string(),
            ));
        }

        tracing::info!("Found {} records affected by the merge", affected.len());

        let retired: Vec<i64> = source_ids.into_iter().filter(|id| *id != dest.id).collect();

        for record in &affected {
            for tag_id in &retired {
                self.repo.unlink_tag_tx(&mut tx, record.id, *tag_id).await?;
            }
            self.repo.link_tag_tx(&mut tx, record.id, dest.id).await?;
        }

        for tag_id in &retired {
            self.repo.delete_tag_tx(&mut tx, *tag_id).await?;
        }

        tx.commit().await?;

        tracing::info!("Tag merge into '{}' completed", new_name);
        Ok(MergeOutcome {
            tag: dest,
            records: affected.into_iter().map(|r| r.uid).collect(),
        })
    }

    /// Delete every tag that no record references
    pub async fn collect_garbage(&self) -> Result<u64> {
        let mut tx = self.repo.begin().await?;
        let removed = self.repo.delete_orphan_tags_tx(&mut tx).await?;
        tx.commit().await?;

        tracing::info!("Tag garbage collection removed {} tags", removed);
        Ok(removed)
    }
}
