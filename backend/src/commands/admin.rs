//! Administrative commands
//!
//! Bulk import, color updates and destructive maintenance.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{ColorUpdateReport, ImportReport};
use std::path::Path;

/// Import an XML image batch from a file
pub async fn import_images(state: &AppState, path: &Path) -> Result<ImportReport> {
    state.import.import_xml_file(path).await
}

/// Import an XML image batch from memory
pub async fn import_images_xml(state: &AppState, xml: &str) -> Result<ImportReport> {
    state.import.import_xml_str(xml).await
}

/// Re-run the color update from a sample file
pub async fn update_colors(state: &AppState, path: &Path) -> Result<ColorUpdateReport> {
    state.colors.apply_color_file(path).await
}

/// Delete a record by id; tags it alone referenced go with it
pub async fn delete_record(state: &AppState, id: i64) -> Result<()> {
    state.records.delete_record(id).await
}

pub async fn delete_all_records(state: &AppState) -> Result<u64> {
    state.records.delete_all_records().await
}

pub async fn delete_all_users(state: &AppState) -> Result<u64> {
    state.users.delete_all_users().await
}
