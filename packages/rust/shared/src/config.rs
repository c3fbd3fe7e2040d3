//! Application configuration for scorepull.
//!
//! User config lives at `~/.scorepull/scorepull.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScorePullError};
use crate::types::DEFAULT_PAGE_SIZE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scorepull.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scorepull";

// ---------------------------------------------------------------------------
// Config structs (matching scorepull.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream endpoint and fixed query context.
    #[serde(default)]
    pub source: SourceConfig,

    /// Run-wide settings.
    #[serde(default)]
    pub run: RunDefaults,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Score listing endpoint (without query string).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `componentId` query parameter.
    #[serde(default = "default_component_id")]
    pub component_id: String,

    /// `pageId` query parameter.
    #[serde(default = "default_page_id")]
    pub page_id: String,

    /// Subject grouping (`group`).
    #[serde(default = "default_group")]
    pub group: String,

    /// Lower bound of the score range (`from`).
    #[serde(default)]
    pub score_from: u32,

    /// Upper bound of the score range (`to`).
    #[serde(default = "default_score_to")]
    pub score_to: u32,

    /// Listing type (`type`).
    #[serde(default = "default_listing_type")]
    pub listing_type: u32,

    /// Records per page (`pageSize`).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            component_id: default_component_id(),
            page_id: default_page_id(),
            group: default_group(),
            score_from: 0,
            score_to: default_score_to(),
            listing_type: default_listing_type(),
            page_size: default_page_size(),
        }
    }
}

fn default_base_url() -> String {
    "https://vietnamnet.vn/newsapi/EducationScore/GetSchoolByScore".into()
}
fn default_component_id() -> String {
    "COMPONENT002310".into()
}
fn default_page_id() -> String {
    "499756218a1449d9b9305de4c14db9bb".into()
}
fn default_group() -> String {
    "A".into()
}
fn default_score_to() -> u32 {
    40
}
fn default_listing_type() -> u32 {
    2
}
fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    /// Exam year to extract.
    #[serde(default = "default_year")]
    pub year: i32,

    /// Number of pages to request, starting at page 0.
    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// Maximum page fetches in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Directory the output file is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            year: default_year(),
            page_count: default_page_count(),
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_year() -> i32 {
    2015
}
fn default_page_count() -> u32 {
    200
}
fn default_concurrency() -> u32 {
    1
}
fn default_output_dir() -> String {
    ".".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one extraction run - merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Endpoint and query context.
    pub source: SourceConfig,
    /// Exam year to extract.
    pub year: i32,
    /// Number of pages, `0..page_count`.
    pub page_count: u32,
    /// Maximum page fetches in flight.
    pub concurrency: u32,
    /// Output CSV path.
    pub output_path: PathBuf,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        let year = config.run.year;
        Self {
            source: config.source.clone(),
            year,
            page_count: config.run.page_count,
            concurrency: config.run.concurrency,
            output_path: PathBuf::from(&config.run.output_dir).join(output_file_name(year)),
        }
    }
}

impl RunConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(ScorePullError::config("concurrency must be at least 1"));
        }
        if self.source.page_size == 0 {
            return Err(ScorePullError::config("page_size must be at least 1"));
        }
        Url::parse(&self.source.base_url).map_err(|e| {
            ScorePullError::config(format!("invalid base_url '{}': {e}", self.source.base_url))
        })?;
        Ok(())
    }
}

/// Default output file name for a given year.
pub fn output_file_name(year: i32) -> String {
    format!("data_score_{year}.csv")
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.scorepull/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScorePullError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.scorepull/scorepull.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScorePullError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ScorePullError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScorePullError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = render_config(&AppConfig::default())?;

    std::fs::write(&path, content).map_err(|e| ScorePullError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Serialize a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| ScorePullError::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = render_config(&AppConfig::default()).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("COMPONENT002310"));
        assert!(toml_str.contains("page_count"));
    }

    #[test]
    fn config_roundtrip() {
        let toml_str = render_config(&AppConfig::default()).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.run.year, 2015);
        assert_eq!(parsed.run.page_count, 200);
        assert_eq!(parsed.source.page_size, 20);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[source]
group = "D1"

[run]
year = 2016
concurrency = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.source.group, "D1");
        assert_eq!(config.source.score_to, 40);
        assert_eq!(config.run.year, 2016);
        assert_eq!(config.run.concurrency, 8);
        assert_eq!(config.run.page_count, 200);
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.concurrency, 1);
        assert_eq!(run.page_count, 200);
        assert_eq!(run.output_path, PathBuf::from(".").join("data_score_2015.csv"));
        assert!(run.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_concurrency() {
        let mut run = RunConfig::from(&AppConfig::default());
        run.concurrency = 0;
        let err = run.validate().unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn validation_rejects_bad_base_url() {
        let mut run = RunConfig::from(&AppConfig::default());
        run.source.base_url = "not a url".into();
        assert!(run.validate().is_err());
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("scorepull-missing-dir/none.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ScorePullError::Io { .. }));
    }
}
