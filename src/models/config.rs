//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote catalog endpoint and HTTP behavior
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Pass behavior
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Retry and polling cadence
    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load a configuration file and validate it. A missing or malformed file
    /// is an error here, never a fallback to defaults.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.user_agent.trim().is_empty() {
            return Err(AppError::validation("catalog.user_agent is empty"));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(AppError::validation("catalog.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.catalog.service_index_url).map_err(|e| {
            AppError::validation(format!("catalog.service_index_url is invalid: {e}"))
        })?;
        if let Some(index_url) = &self.catalog.index_url {
            url::Url::parse(index_url).map_err(|e| {
                AppError::validation(format!("catalog.index_url is invalid: {e}"))
            })?;
        }
        validate_cursor_name(&self.processor.cursor_name)?;
        if let (Some(min), Some(max)) = (
            self.processor.default_min_commit_timestamp,
            self.processor.max_commit_timestamp,
        ) {
            if min >= max {
                return Err(AppError::validation(
                    "processor.default_min_commit_timestamp must be before max_commit_timestamp",
                ));
            }
        }
        if self.runner.poll_interval_secs == 0 {
            return Err(AppError::validation("runner.poll_interval_secs must be > 0"));
        }
        if self.runner.max_attempts == Some(0) {
            return Err(AppError::validation("runner.max_attempts must be > 0"));
        }
        Ok(())
    }
}

/// Cursor names become file names, so they are limited to `[A-Za-z0-9._-]`.
pub fn validate_cursor_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("processor.cursor_name is empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(AppError::validation(format!(
            "processor.cursor_name '{name}' may only contain [A-Za-z0-9._-]"
        )));
    }
    Ok(())
}

/// Remote catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// V3 service index used to discover the catalog
    #[serde(default = "defaults::service_index_url")]
    pub service_index_url: String,

    /// Catalog index URL; skips service index discovery when set
    #[serde(default)]
    pub index_url: Option<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            service_index_url: defaults::service_index_url(),
            index_url: None,
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Settings for a single catalog pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Logical stream name; one cursor per name
    #[serde(default = "defaults::cursor_name")]
    pub cursor_name: String,

    /// Lower bound used when no cursor exists yet
    #[serde(default)]
    pub default_min_commit_timestamp: Option<DateTime<Utc>>,

    /// First run starts at "now" instead of the beginning of the catalog.
    /// Ignored when `default_min_commit_timestamp` is set.
    #[serde(default)]
    pub start_from_now: bool,

    /// Fixed upper bound instead of the wall clock
    #[serde(default)]
    pub max_commit_timestamp: Option<DateTime<Utc>>,

    /// Keep only the newest leaf per package id and version within a page
    #[serde(default = "defaults::enabled")]
    pub exclude_redundant_leaves: bool,

    /// Fetch the full document for package details leaves
    #[serde(default = "defaults::enabled")]
    pub fetch_package_details: bool,

    /// Fetch the full document for package delete leaves
    #[serde(default = "defaults::enabled")]
    pub fetch_package_deletes: bool,
}

impl ProcessorConfig {
    /// Lower bound for a pass that found no stored cursor.
    pub fn initial_min_commit_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.default_min_commit_timestamp {
            Some(min) => min,
            None if self.start_from_now => now,
            None => defaults::min_commit_timestamp(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            cursor_name: defaults::cursor_name(),
            default_min_commit_timestamp: None,
            start_from_now: false,
            max_commit_timestamp: None,
            exclude_redundant_leaves: true,
            fetch_package_details: true,
            fetch_package_deletes: true,
        }
    }
}

/// Retry and polling cadence for the CLI loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Delay between continuous polling passes
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Delay before retrying a failed pass
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Give up after this many failed attempts (unbounded when absent)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl RunnerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::poll_interval(),
            retry_delay_secs: defaults::retry_delay(),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

pub(crate) mod defaults {
    use chrono::{DateTime, Utc};

    // Catalog defaults
    pub fn service_index_url() -> String {
        "https://api.nuget.org/v3/index.json".into()
    }
    pub fn user_agent() -> String {
        "catalog-crawler/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Processor defaults
    pub fn cursor_name() -> String {
        "catalog".into()
    }
    pub fn enabled() -> bool {
        true
    }

    /// 0001-01-01T00:00:00Z, older than anything in the catalog.
    pub fn min_commit_timestamp() -> DateTime<Utc> {
        DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    // Runner defaults
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn retry_delay() -> u64 {
        10
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.catalog.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_cursor_name() {
        let mut config = Config::default();
        config.processor.cursor_name = "../escape".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let mut config = Config::default();
        config.processor.default_min_commit_timestamp =
            Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        config.processor.max_commit_timestamp =
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [processor]
            cursor_name = "mirror"
            exclude_redundant_leaves = false
            max_commit_timestamp = "2020-06-01T00:00:00Z"

            [runner]
            retry_delay_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.processor.cursor_name, "mirror");
        assert!(!config.processor.exclude_redundant_leaves);
        assert!(config.processor.fetch_package_details);
        assert_eq!(
            config.processor.max_commit_timestamp,
            Some(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.runner.retry_delay_secs, 3);
        assert_eq!(config.runner.poll_interval_secs, 60);
        assert_eq!(config.catalog.service_index_url, "https://api.nuget.org/v3/index.json");
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        assert!(Config::load(&path).is_err());

        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.processor.cursor_name, "catalog");
    }

    #[test]
    fn load_validated_rejects_broken_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        assert!(Config::load_validated(&path).is_err());

        std::fs::write(&path, "[processor\ncursor_name = ").unwrap();
        assert!(matches!(Config::load_validated(&path), Err(AppError::Toml(_))));

        std::fs::write(&path, "[processor]\ncursor_name = \"../x\"\n").unwrap();
        assert!(matches!(
            Config::load_validated(&path),
            Err(AppError::Validation(_))
        ));

        std::fs::write(&path, "[processor]\ncursor_name = \"mirror\"\n").unwrap();
        assert_eq!(
            Config::load_validated(&path).unwrap().processor.cursor_name,
            "mirror"
        );
    }

    #[test]
    fn initial_min_follows_first_run_policy() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut processor = ProcessorConfig::default();
        assert_eq!(processor.initial_min_commit_timestamp(now).year(), 1);

        processor.start_from_now = true;
        assert_eq!(processor.initial_min_commit_timestamp(now), now);

        let explicit = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        processor.default_min_commit_timestamp = Some(explicit);
        assert_eq!(processor.initial_min_commit_timestamp(now), explicit);
    }
}
