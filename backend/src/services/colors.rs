//! Color enrichment
//!
//! Classifies HSB samples keyed by image source name and stores the result as
//! the primary color of the matching record.

use crate::color::{classify, HsbSample};
use crate::database::Repository;
use crate::error::{AppError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

/// Outcome of one color update pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColorUpdateReport {
    pub updated: usize,
    /// Source names with no matching record
    pub missing: Vec<String>,
    /// Source names whose sample could not be read
    pub invalid: Vec<String>,
}

/// Service applying color samples to records
#[derive(Clone)]
pub struct ColorService {
    repo: Repository,
}

impl ColorService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Classify each sample and store it on the record with that source name.
    ///
    /// Samples for unknown sources are logged and skipped.
    pub async fn apply_samples<'a>(
        &self,
        samples: impl IntoIterator<Item = (&'a str, HsbSample)>,
    ) -> Result<ColorUpdateReport> {
        let mut report = ColorUpdateReport::default();

        for (source_name, sample) in samples {
            let color = classify(sample);

            if self.repo.set_primary_color(source_name, color).await? {
                tracing::debug!("Set color of {} to {}", source_name, color);
                report.updated += 1;
            } else {
                tracing::warn!("No record found for src: {}", source_name);
                report.missing.push(source_name.to_string());
            }
        }

        Ok(report)
    }

    /// Apply a JSON object mapping source names to HSB samples
    pub async fn apply_color_json(&self, json: &str) -> Result<ColorUpdateReport> {
        let root: Value =
            serde_json::from_str(json).map_err(|e| AppError::Parse(e.to_string()))?;
        let Value::Object(entries) = root else {
            return Err(AppError::Parse(
                "Color samples must be a JSON object".to_string(),
            ));
        };

        let mut samples = Vec::with_capacity(entries.len());
        let mut invalid = Vec::new();

        for (source_name, value) in &entries {
            match serde_json::from_value::<HsbSample>(value.clone()) {
                Ok(sample) => samples.push((source_name.as_str(), sample)),
                Err(e) => {
                    tracing::warn!("Skipping color sample for {}: {}", source_name, e);
                    invalid.push(source_name.clone());
                }
            }
        }

        let mut report = self.apply_samples(samples).await?;
        report.invalid = invalid;

        tracing::info!(
            "Color update finished: {} updated, {} missing, {} invalid",
            report.updated,
            report.missing.len(),
            report.invalid.len()
        );
        Ok(report)
    }

    /// Read and apply a color sample file
    pub async fn apply_color_file(&self, path: &Path) -> Result<ColorUpdateReport> {
        tracing::info!("Updating colors from {:?}", path);

        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Upstream(format!("{}: {}", path.display(), e)))?;

        self.apply_color_json(&json).await
    }

    /// Run a color update in the background.
    ///
    /// There is no ordering against imports; records that do not exist yet
    /// are reported as missing. Failures are logged, never propagated.
    pub fn spawn_enrichment(&self, path: PathBuf) -> JoinHandle<()> {
        let service = self.clone();

        tokio::spawn(async move {
            match service.apply_color_file(&path).await {
                Ok(report) => tracing::info!(
                    "Background color update complete: {} records updated",
                    report.updated
                ),
                Err(e) => tracing::error!("Background color update failed: {}", e),
            }
        })
    }
}
