//! Settings loading and typed configuration
//!
//! Settings come from a YAML file layered with `STATLAKE_`-prefixed
//! environment variables, read once at startup and passed by reference into
//! every component.

use crate::error::{IngestError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default HTTP timeout for listing and file fetches.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default number of fetch attempts per candidate.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default first year for the partition layout skeleton.
pub const DEFAULT_LAYOUT_START_YEAR: i32 = 2010;

/// Top-level settings for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpConfig,
    pub local: LocalConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    pub datasets: Vec<DatasetConfig>,
}

/// HTTP client behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bounded network read: a slow fetch fails the candidate, not the run.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fetch attempts per candidate, with exponential backoff between them.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

/// Local filesystem paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Staging directory for downloaded files.
    pub staging_dir: PathBuf,

    /// Location of the persisted fingerprint mapping.
    pub state_file: PathBuf,
}

/// S3-compatible object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for MinIO or other S3-compatible stores.
    pub endpoint: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    pub bucket: String,

    /// Key prefix under which raw files land (e.g. "raw").
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,

    #[serde(default = "default_access_key")]
    pub access_key: String,

    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    #[serde(default)]
    pub path_style: bool,

    /// Bucket location constraint used when the bucket has to be created.
    /// Defaults to the configured region.
    pub location: Option<String>,

    /// Storage class applied to uploaded objects.
    #[serde(default = "default_storage_class")]
    pub storage_class: String,
}

/// Partition layout initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// First year of the year/month prefix skeleton.
    #[serde(default = "default_start_year")]
    pub start_year: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
        }
    }
}

/// One dataset to watch and ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Logical dataset name; doubles as the fingerprint key for static
    /// sources and as a destination path segment.
    pub name: String,

    pub source: SourceConfig,

    /// Filename match patterns (regex search semantics). An empty list
    /// selects nothing.
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub partitioning: Partitioning,
}

/// Where a dataset's candidate files come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A fixed file URL declared in configuration.
    Static { url: String },

    /// A listing page scraped for links starting with a prefix.
    Listing { page_url: String, link_prefix: String },
}

/// How the destination key encodes the dataset's period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// `<prefix>/<dataset>/<year>/<month:02>/<filename>`, period taken from
    /// the filename with a processing-date fallback.
    #[default]
    Period,

    /// `<prefix>/<dataset>/ingestion_date=<YYYY-MM-DD>/<filename>` for
    /// datasets with no intrinsic period.
    IngestionDate,
}

impl Settings {
    /// Load settings from a YAML file, layered with `STATLAKE_`-prefixed
    /// environment variables (environment wins).
    pub fn load(path: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("STATLAKE").separator("__"))
            .build()
            .map_err(|e| IngestError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| IngestError::Config(e.to_string()))
    }

    /// Parse settings from a YAML string. Used by tests and embedding.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .map_err(|e| IngestError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| IngestError::Config(e.to_string()))
    }

    /// Keep only the named dataset. Errors when the name is unknown.
    pub fn select_dataset(&mut self, name: &str) -> Result<()> {
        self.datasets.retain(|d| d.name == name);
        if self.datasets.is_empty() {
            return Err(IngestError::Config(format!(
                "no dataset named '{}' in settings",
                name
            )));
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_user_agent() -> String {
    "statlake-ingest/0.1".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_raw_prefix() -> String {
    "raw".to_string()
}

fn default_access_key() -> String {
    std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "minioadmin".to_string())
}

fn default_secret_key() -> String {
    std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string())
}

fn default_storage_class() -> String {
    "STANDARD".to_string()
}

fn default_start_year() -> i32 {
    DEFAULT_LAYOUT_START_YEAR
}
