use callframe_common::{Error, Result};
use callframe_engine::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_display_rows")]
    pub display_rows: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub csv: CsvSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_display_rows() -> usize {
    20
}

fn default_batch_size() -> usize {
    8192
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_has_header() -> bool {
    true
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self { delimiter: default_delimiter(), has_header: default_has_header() }
    }
}

impl Settings {
    /// Reads the file named by `CALLFRAME_CONFIG_PATH` (default
    /// `callframe.toml`, optional) with `CALLFRAME__*` overrides.
    pub fn new() -> std::result::Result<Self, config::ConfigError> {
        let config_file_path = std::env::var("CALLFRAME_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("callframe.toml"));
        Self::build(&config_file_path, false)
    }

    /// Reads an explicitly named file, which must exist.
    pub fn from_path(path: &Path) -> std::result::Result<Self, config::ConfigError> {
        Self::build(path, true)
    }

    fn build(path: &Path, required: bool) -> std::result::Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(config::Environment::with_prefix("CALLFRAME").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { batch_size: self.batch_size }
    }

    /// The CSV delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8> {
        match self.csv.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(Error::Config(format!(
                "csv.delimiter must be a single ASCII character, got '{}'",
                self.csv.delimiter
            ))),
        }
    }
}
