//! Tag-related commands

use crate::app::AppState;
use crate::database::{Tag, TagSummary};
use crate::error::Result;
use crate::services::{DetachOutcome, MergeOutcome};

/// List all tags with reference counts
pub async fn list_tags(state: &AppState) -> Result<Vec<TagSummary>> {
    state.tags.list_tags().await
}

/// Attach a tag to a record by name
pub async fn attach_tag(state: &AppState, uid: &str, name: &str) -> Result<Tag> {
    state.tags.attach(uid, name).await
}

/// Remove a tag from one record
pub async fn detach_tag(state: &AppState, uid: &str, tag_id: i64) -> Result<DetachOutcome> {
    state.tags.detach(uid, tag_id).await
}

/// Remove a tag from every record and delete it
pub async fn purge_tag(state: &AppState, tag_id: i64) -> Result<u64> {
    state.tags.purge_everywhere(tag_id).await
}

pub async fn merge_tags(
    state: &AppState,
    name_a: &str,
    name_b: &str,
    new_name: &str,
) -> Result<MergeOutcome> {
    state.tags.merge(name_a, name_b, new_name).await
}

/// Delete unreferenced tags
pub async fn collect_tag_garbage(state: &AppState) -> Result<u64> {
    state.tags.collect_garbage().await
}
