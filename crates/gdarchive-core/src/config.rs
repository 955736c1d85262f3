//! Configuration module for gdarchive.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Every section is optional in the file; missing keys take their defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::graph::{DEFAULT_MAIN_NAME, DEFAULT_ORPHANED_NAME};
use crate::domain::mime::{ExportFormat, MimePolicy};
use crate::domain::path::path_segment;
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for gdarchive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,
    pub download: DownloadConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    /// Per-mime-type export overrides, merged over the built-in table.
    pub exports: BTreeMap<String, ExportFormat>,
}

/// Remote drive settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Id of the folder archived as the main tree; discovered when unset.
    pub root_id: Option<String>,
    /// API base URL; the production endpoint when unset.
    pub base_url: Option<String>,
    /// File holding an OAuth access token.
    pub token_file: Option<PathBuf>,
}

/// Local output and worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory the archive is written to.
    pub output_dir: Option<PathBuf>,
    /// Concurrent transfers; `0` uses the host's available parallelism.
    pub workers: usize,
    /// Whether the orphaned tree is archived after the main tree.
    pub include_orphaned: bool,
    /// Directory name of the main tree.
    pub main_name: String,
    /// Directory name of the orphaned tree.
    pub orphaned_name: String,
}

/// Backoff settings for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Total attempts per operation; `1` disables retrying, `0` is unlimited.
    pub max_attempts: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            workers: 0,
            include_orphaned: true,
            main_name: DEFAULT_MAIN_NAME.to_string(),
            orphaned_name: DEFAULT_ORPHANED_NAME.to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RetryConfig {
    /// Backoff policy described by this section.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.initial_delay_ms), self.max_attempts)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/gdarchive/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("gdarchive")
            .join("config.yaml")
    }

    /// Mime policy: the built-in table with `exports` merged over it.
    pub fn mime_policy(&self) -> MimePolicy {
        MimePolicy::google_workspace().with_overrides(&self.exports)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"retry.initial_delay_ms"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- drive ---
        if let Some(url) = &self.drive.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ValidationError::new(
                    "drive.base_url",
                    format!("must be an http(s) URL, got '{url}'"),
                ));
            }
        }

        // --- download ---
        if self.download.main_name.trim().is_empty() {
            errors.push(ValidationError::new("download.main_name", "must not be empty"));
        }
        if self.download.orphaned_name.trim().is_empty() {
            errors.push(ValidationError::new("download.orphaned_name", "must not be empty"));
        }
        // Both roots become top-level directories under the output dir
        if path_segment(&self.download.main_name) == path_segment(&self.download.orphaned_name) {
            errors.push(ValidationError::new(
                "download.orphaned_name",
                "must map to a different directory than download.main_name",
            ));
        }

        // --- retry ---
        if self.retry.initial_delay_ms == 0 {
            errors.push(ValidationError::new(
                "retry.initial_delay_ms",
                "must be greater than 0",
            ));
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        // --- exports ---
        for (source, format) in &self.exports {
            if format.mime_type.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("exports.{source}.mime_type"),
                    "must not be empty",
                ));
            }
            if !format.extension.starts_with('.') || format.extension.len() < 2 {
                errors.push(ValidationError::new(
                    format!("exports.{source}.extension"),
                    format!("must start with '.', got '{}'", format.extension),
                ));
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- drive ---

    pub fn root_id(mut self, root_id: impl Into<String>) -> Self {
        self.config.drive.root_id = Some(root_id.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.drive.base_url = Some(base_url.into());
        self
    }

    pub fn token_file(mut self, path: PathBuf) -> Self {
        self.config.drive.token_file = Some(path);
        self
    }

    // --- download ---

    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.config.download.output_dir = Some(dir);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.download.workers = workers;
        self
    }

    pub fn include_orphaned(mut self, include: bool) -> Self {
        self.config.download.include_orphaned = include;
        self
    }

    pub fn main_name(mut self, name: impl Into<String>) -> Self {
        self.config.download.main_name = name.into();
        self
    }

    pub fn orphaned_name(mut self, name: impl Into<String>) -> Self {
        self.config.download.orphaned_name = name.into();
        self
    }

    // --- retry ---

    pub fn retry_initial_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.initial_delay_ms = ms;
        self
    }

    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- exports ---

    pub fn export(mut self, source_mime: impl Into<String>, format: ExportFormat) -> Self {
        self.config.exports.insert(source_mime.into(), format);
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
