//! Application configuration module
//!
//! Settings are layered, lowest precedence first: built-in defaults, the TOML
//! file, `.env` plus `SCHEMASYNC_*` environment variables, then command-line
//! flags. The merged result is validated once before any dataset is touched.

use crate::models::SourceFormat;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "schemasync.toml";
pub const ENV_PREFIX: &str = "SCHEMASYNC";

static DATASET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("dataset name pattern"));
static ENV_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z_]+$").expect("env tag pattern"));

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Cannot determine format of {0}; set `format` explicitly")]
    UnknownFormat(PathBuf),

    #[error("Duplicate dataset name: {0}")]
    DuplicateDataset(String),

    #[error("No datasets configured")]
    NoDatasets,
}

/// One configured dataset
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatasetConfig {
    pub path: PathBuf,

    #[validate(custom(function = "validate_dataset_name"))]
    pub name: String,

    #[serde(default)]
    pub format: Option<SourceFormat>,

    #[serde(default)]
    pub description: Option<String>,
}

impl DatasetConfig {
    /// Explicit format, or the one implied by the file extension
    pub fn resolved_format(&self) -> Result<SourceFormat, ConfigError> {
        self.format
            .or_else(|| SourceFormat::from_path(&self.path))
            .ok_or_else(|| ConfigError::UnknownFormat(self.path.clone()))
    }
}

/// Complete application settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(custom(function = "validate_service_url"))]
    pub service_url: String,

    #[serde(default)]
    pub token: Option<String>,

    /// Catalog platform; each dataset's format when unset
    #[serde(default)]
    pub platform: Option<String>,

    #[validate(custom(function = "validate_env"))]
    pub env: String,

    pub cache_dir: PathBuf,
    pub report_dir: PathBuf,

    #[serde(default)]
    pub open_reports: bool,

    #[serde(default)]
    pub viewer_command: Option<String>,

    #[validate(range(min = 1, message = "request_timeout_secs must be at least 1"))]
    pub request_timeout_secs: u64,

    #[serde(default)]
    #[validate(range(min = 1, message = "processing_timeout_secs must be at least 1"))]
    pub processing_timeout_secs: Option<u64>,

    #[serde(default)]
    #[validate(nested)]
    pub datasets: Vec<DatasetConfig>,
}

/// Values given on the command line; `None` leaves lower layers untouched
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub service_url: Option<String>,
    pub platform: Option<String>,
    pub env: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub open_reports: bool,
    pub require_datasets: bool,
}

impl Settings {
    /// Load and validate settings from every layer
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let (file, required) = match &overrides.config_file {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let layered = ::config::Config::builder()
            .set_default("service_url", "http://localhost:8080")?
            .set_default("env", "DEV")?
            .set_default("cache_dir", "./schema_cache")?
            .set_default("report_dir", "./reports")?
            .set_default("open_reports", false)?
            .set_default("request_timeout_secs", 30)?
            .add_source(::config::File::from(file.as_path()).required(required))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("service_url", overrides.service_url.clone())?
            .set_override_option("platform", overrides.platform.clone())?
            .set_override_option("env", overrides.env.clone())?
            .set_override_option("cache_dir", overrides.cache_dir.as_deref().map(path_value))?
            .set_override_option("report_dir", overrides.report_dir.as_deref().map(path_value))?
            .set_override_option("open_reports", overrides.open_reports.then_some(true))?
            .build()?;

        let settings: Settings = layered.try_deserialize()?;
        settings.finish(overrides.require_datasets)
    }

    /// Normalize and validate a deserialized configuration
    pub fn finish(mut self, require_datasets: bool) -> Result<Self, ConfigError> {
        self.env = self.env.trim().to_uppercase();
        self.service_url = self.service_url.trim().to_string();
        self.validate()?;

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(dataset.name.clone()));
            }
            dataset.resolved_format()?;
        }

        if require_datasets && self.datasets.is_empty() {
            return Err(ConfigError::NoDatasets);
        }

        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn processing_timeout(&self) -> Option<Duration> {
        self.processing_timeout_secs.map(Duration::from_secs)
    }
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn validate_service_url(value: &str) -> Result<(), ValidationError> {
    let parsed = url::Url::parse(value).map_err(|_| {
        let mut err = ValidationError::new("invalid_url");
        err.message = Some(format!("service_url is not a valid URL: {}", value).into());
        err
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        let mut err = ValidationError::new("unsupported_scheme");
        err.message = Some("service_url must use http or https".into());
        return Err(err);
    }

    Ok(())
}

fn validate_env(value: &str) -> Result<(), ValidationError> {
    if !ENV_TAG.is_match(value) {
        let mut err = ValidationError::new("invalid_env");
        err.message = Some("env must contain only letters and underscores".into());
        return Err(err);
    }
    Ok(())
}

fn validate_dataset_name(name: &str) -> Result<(), ValidationError> {
    if !DATASET_NAME.is_match(name) {
        let mut err = ValidationError::new("invalid_dataset_name");
        err.message = Some(
            "Dataset names must start with a letter or digit and contain only letters, digits, '.', '_' or '-'"
                .into(),
        );
        return Err(err);
    }
    Ok(())
}
