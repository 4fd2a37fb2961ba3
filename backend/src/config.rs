//! Application configuration constants
//!
//! Central location for all configuration constants, classification
//! thresholds, and defaults used throughout the application.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ===== Import =====

/// Namespace prefix prepended to an external image id to form a record uid
pub const UID_PREFIX: &str = "1.2.826.0.1.3680043.";

// ===== Color Classification =====

/// Samples with saturation below this are classified as white
pub const MIN_SATURATION: f32 = 30.0;

/// Samples with brightness below this are classified as white
pub const MIN_BRIGHTNESS: f32 = 30.0;

/// Weight applied to the squared hue difference
pub const HUE_WEIGHT: f32 = 2.0;

// ===== User Defaults =====

pub const DEFAULT_SLIDER_VALUE: &str = "50";
pub const DEFAULT_MODE: &str = "dark";
pub const DEFAULT_LANGUAGE: &str = "de";

// ===== Database =====

/// Connections in the application pool
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits for the SQLite write lock, in seconds
pub const BUSY_TIMEOUT_SECS: u64 = 5;

/// Default database file name
pub const DEFAULT_DATABASE_FILE: &str = "slidecat.db";

/// Runtime configuration resolved from the command line and environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// XML descriptor batch imported on startup, if present
    #[serde(default)]
    pub import_xml: Option<PathBuf>,
    /// JSON color samples applied in the background on startup, if present
    #[serde(default)]
    pub color_json: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            import_xml: None,
            color_json: None,
        }
    }
}
