//! Bulk import of image descriptors
//!
//! Records are keyed by a uid derived from the descriptor's external id.
//! Importing is additive: a uid that already exists is skipped, never updated,
//! so running the same batch twice leaves the catalog as running it once.

use crate::config::UID_PREFIX;
use crate::database::{NewRecord, Repository};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One image as described by an external batch
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageDescriptor {
    /// Numeric external id
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "originalURL")]
    pub original_url: Option<String>,
    #[serde(default)]
    pub magnification: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Root of an XML batch: any element wrapping repeated `<image>` entries
#[derive(Debug, Default, Deserialize)]
struct ImageBatch {
    #[serde(rename = "image", default)]
    images: Vec<ImageDescriptor>,
}

/// Outcome of one import batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    /// Uids of descriptors that could not be stored
    pub failed: Vec<String>,
}

/// Parse an XML batch into descriptors
pub fn parse_batch(xml: &str) -> Result<Vec<ImageDescriptor>> {
    let batch: ImageBatch = quick_xml::de::from_str(xml)?;
    Ok(batch.images)
}

/// Derive the record uid for an external id.
///
/// The id is read as an unsigned integer, so surrounding whitespace and
/// leading zeros do not produce distinct uids.
pub fn stable_uid(external_id: Option<&str>) -> Result<String> {
    let raw = external_id.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::Parse("Image is missing its uid".to_string()));
    }

    let id: u64 = raw
        .parse()
        .map_err(|_| AppError::Parse(format!("Image uid '{}' is not a number", raw)))?;

    Ok(format!("{}{}", UID_PREFIX, id))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Service reconciling descriptor batches with the catalog
#[derive(Clone)]
pub struct ImportService {
    repo: Repository,
}

impl ImportService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Import a batch of descriptors.
    ///
    /// Every uid is computed before anything is written, so a malformed id
    /// fails the whole batch untouched. After that each descriptor stands
    /// alone: one that cannot be stored is reported and the rest proceed.
    pub async fn import_descriptors(&self, descriptors: &[ImageDescriptor]) -> Result<ImportReport> {
        let keyed = descriptors
            .iter()
            .map(|d| stable_uid(d.uid.as_deref()).map(|uid| (uid, d)))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Importing {} image descriptors", keyed.len());

        let mut report = ImportReport::default();

        for (uid, descriptor) in keyed {
            let Some(source_name) = non_empty(&descriptor.src) else {
                tracing::warn!("Image {} has no src, skipping", uid);
                report.failed.push(uid);
                continue;
            };

            let record = NewRecord {
                uid,
                source_name,
                description: non_empty(&descriptor.description),
                original_url: non_empty(&descriptor.original_url),
                magnification: non_empty(&descriptor.magnification),
                author: non_empty(&descriptor.author),
            };

            match self.repo.insert_record_if_absent(&record).await {
                Ok(true) => {
                    tracing::debug!("Imported record {}", record.uid);
                    report.imported += 1;
                }
                Ok(false) => {
                    tracing::debug!("Record {} already exists", record.uid);
                    report.skipped += 1;
                }
                Err(AppError::Conflict(reason)) => {
                    tracing::warn!(
                        "Record {} clashes on src {}: {}",
                        record.uid,
                        record.source_name,
                        reason
                    );
                    report.failed.push(record.uid);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Import finished: {} imported, {} skipped, {} failed",
            report.imported,
            report.skipped,
            report.failed.len()
        );
        Ok(report)
    }

    pub async fn import_xml_str(&self, xml: &str) -> Result<ImportReport> {
        let descriptors = parse_batch(xml)?;
        self.import_descriptors(&descriptors).await
    }

    pub async fn import_xml_file(&self, path: &Path) -> Result<ImportReport> {
        tracing::info!("Importing images from {:?}", path);
        let xml = tokio::fs::read_to_string(path).await?;
        self.import_xml_str(&xml).await
    }

    /// Import the configured batch if the file exists
    pub async fn import_on_startup(&self, path: &Path) -> Result<Option<ImportReport>> {
        if !tokio::fs::try_exists(path).await? {
            tracing::info!("No image batch at {:?}, skipping import", path);
            return Ok(None);
        }

        self.import_xml_file(path).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    const BATCH: &str = r#"
        <images>
            <image>
                <uid>42</uid>
                <src>a.png</src>
                <description>liver tumor</description>
                <originalURL>http://example.org/a</originalURL>
                <magnification>40x</magnification>
                <author>Meier</author>
            </image>
            <image>
                <uid>0043</uid>
                <src>b.png</src>
                <description>skin</description>
                <scanner>ignored</scanner>
            </image>
        </images>
    "#;

    async fn create_test_service() -> (ImportService, Repository) {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        (ImportService::new(repo.clone()), repo)
    }

    #[test]
    fn test_stable_uid() {
        assert_eq!(stable_uid(Some("42")).unwrap(), "1.2.826.0.1.3680043.42");
        assert_eq!(stable_uid(Some(" 0042 ")).unwrap(), "1.2.826.0.1.3680043.42");
        assert!(matches!(stable_uid(Some("")), Err(AppError::Parse(_))));
        assert!(matches!(stable_uid(None), Err(AppError::Parse(_))));
        assert!(matches!(stable_uid(Some("4a")), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_parse_batch_reads_fields() {
        let images = parse_batch(BATCH).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].uid.as_deref(), Some("42"));
        assert_eq!(images[0].original_url.as_deref(), Some("http://example.org/a"));
        assert_eq!(images[1].author, None);
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_batch("<images><image><uid>1</image>").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_import_twice_is_idempotent() {
        let (service, repo) = create_test_service().await;

        let first = service.import_xml_str(BATCH).await.unwrap();
        assert_eq!(first.imported, 2);

        let second = service.import_xml_str(BATCH).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.skipped, 2);

        let records = repo.list_records().await.unwrap();
        assert_eq!(records.len(), 2);

        let record = repo.get_record("1.2.826.0.1.3680043.42").await.unwrap();
        assert_eq!(record.source_name, "a.png");
        assert_eq!(record.author.as_deref(), Some("Meier"));
    }

    #[tokio::test]
    async fn test_existing_uid_is_not_updated() {
        let (service, repo) = create_test_service().await;
        service.import_xml_str(BATCH).await.unwrap();

        let changed = BATCH.replace("liver tumor", "rewritten");
        service.import_xml_str(&changed).await.unwrap();

        let record = repo.get_record("1.2.826.0.1.3680043.42").await.unwrap();
        assert_eq!(record.description.as_deref(), Some("liver tumor"));
    }

    #[tokio::test]
    async fn test_bad_id_fails_whole_batch() {
        let (service, repo) = create_test_service().await;

        let descriptors = vec![
            ImageDescriptor {
                uid: Some("1".into()),
                src: Some("a.png".into()),
                ..Default::default()
            },
            ImageDescriptor {
                uid: Some("".into()),
                src: Some("b.png".into()),
                ..Default::default()
            },
        ];

        let err = service.import_descriptors(&descriptors).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(repo.list_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_descriptor_does_not_stop_batch() {
        let (service, repo) = create_test_service().await;

        let descriptors = vec![
            ImageDescriptor {
                uid: Some("1".into()),
                src: Some("a.png".into()),
                ..Default::default()
            },
            ImageDescriptor {
                uid: Some("2".into()),
                src: Some("a.png".into()),
                ..Default::default()
            },
            ImageDescriptor {
                uid: Some("3".into()),
                src: None,
                ..Default::default()
            },
            ImageDescriptor {
                uid: Some("4".into()),
                src: Some("d.png".into()),
                ..Default::default()
            },
        ];

        let report = service.import_descriptors(&descriptors).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(
            report.failed,
            vec!["1.2.826.0.1.3680043.2", "1.2.826.0.1.3680043.3"]
        );
        assert_eq!(repo.list_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_startup_import_without_file() {
        let (service, _repo) = create_test_service().await;
        let dir = tempfile::tempdir().unwrap();

        let report = service
            .import_on_startup(&dir.path().join("missing.xml"))
            .await
            .unwrap();
        assert!(report.is_none());
    }
}
