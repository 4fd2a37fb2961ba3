//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::AppConfig;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{
    ColorService, ImportReport, ImportService, RecordService, SearchService, TagService,
    UserService,
};
use tokio::task::JoinHandle;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repo: Repository,
    pub records: RecordService,
    pub tags: TagService,
    pub users: UserService,
    pub search: SearchService,
    pub import: ImportService,
    pub colors: ColorService,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Repository) -> Self {
        let users = UserService::new(repo.clone());

        Self {
            config,
            records: RecordService::new(repo.clone(), users.clone()),
            tags: TagService::new(repo.clone()),
            search: SearchService::new(repo.clone(), users.clone()),
            import: ImportService::new(repo.clone()),
            colors: ColorService::new(repo.clone()),
            users,
            repo,
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: AppConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Database: {:?}", config.database_path);

    let pool = create_pool(&config.database_path).await?;
    let state = AppState::new(config, Repository::new(pool));

    tracing::info!("Application initialized successfully");

    Ok(state)
}

/// Import the configured batch, then start color enrichment in the background.
///
/// Returns the import report, if a batch was found, and the enrichment task,
/// if a color file is configured.
pub async fn run_startup(
    state: &AppState,
) -> Result<(Option<ImportReport>, Option<JoinHandle<()>>)> {
    let report = match &state.config.import_xml {
        Some(path) => state.import.import_on_startup(path).await?,
        None => None,
    };

    let enrichment = state
        .config
        .color_json
        .clone()
        .map(|path| state.colors.spawn_enrichment(path));

    Ok((report, enrichment))
}
