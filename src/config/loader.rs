//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. Every field has a default, so a missing config file runs with
//! the public RPC endpoint and the stock detection parameters.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::DetectorConfig;
use crate::domain::dedup::{CURSOR_FILE, HISTORY_FILE};
use crate::domain::known_programs::{PUMP_FUN_PROGRAM, USDC_MINT, WSOL_MINT};

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default)]
    pub enrichment: EnrichmentSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaSection {
    /// RPC endpoint (use a private RPC for sustained polling)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Launchpad program whose transactions are scanned for migrations
    #[serde(default = "default_launchpad_program")]
    pub launchpad_program: String,
}

impl SolanaSection {
    /// Get RPC URL with environment variable override.
    /// Checks SOLANA_RPC_URL env var first, falls back to config value.
    pub fn get_rpc_url(&self) -> String {
        std::env::var("SOLANA_RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            launchpad_program: default_launchpad_program(),
        }
    }
}

/// Detection parameters section
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorSection {
    /// Seconds between cycles in watch mode
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Lookback window in seconds
    #[serde(default = "default_window")]
    pub window_secs: u64,
    /// Max signatures per listing page (node caps this at 1000)
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Concurrent fetch+classify operations per group
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Mints excluded from mint extraction (quote-side assets)
    #[serde(default = "default_ignored_mints")]
    pub ignored_mints: Vec<String>,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            window_secs: default_window(),
            page_limit: default_page_limit(),
            concurrency: default_concurrency(),
            ignored_mints: default_ignored_mints(),
        }
    }
}

/// Enrichment parameters section
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentSection {
    /// Migrations below this market cap are excluded from the report
    #[serde(default = "default_market_cap_floor")]
    pub market_cap_floor_usd: f64,
    /// Optional GeckoTerminal API key for tighter request spacing
    #[serde(default)]
    pub geckoterminal_api_key: Option<String>,
}

impl EnrichmentSection {
    /// Get API key with environment variable fallback.
    /// Checks GECKOTERMINAL_API_KEY env var if config value is empty/None.
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.geckoterminal_api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("GECKOTERMINAL_API_KEY").ok()
    }
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            market_cap_floor_usd: default_market_cap_floor(),
            geckoterminal_api_key: None,
        }
    }
}

/// Persistent state section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Directory for history, cursor, and report files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl StorageSection {
    /// Data directory with ~ expanded
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).into_owned())
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir().join(HISTORY_FILE)
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.data_dir().join(CURSOR_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.data_dir().join("latest_report.json")
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_launchpad_program() -> String {
    PUMP_FUN_PROGRAM.to_string()
}

fn default_poll_interval() -> u64 {
    300
}

fn default_window() -> u64 {
    3600
}

fn default_page_limit() -> usize {
    1000
}

fn default_concurrency() -> usize {
    5
}

fn default_ignored_mints() -> Vec<String> {
    vec![WSOL_MINT.to_string(), USDC_MINT.to_string()]
}

fn default_market_cap_floor() -> f64 {
    20_000.0
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file; a missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        tracing::warn!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.solana.launchpad_program.is_empty() {
            return Err(ConfigError::ValidationError(
                "launchpad_program cannot be empty".to_string(),
            ));
        }

        if self.detector.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.detector.window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "window_secs must be > 0".to_string(),
            ));
        }

        if self.detector.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "concurrency must be > 0".to_string(),
            ));
        }

        if self.detector.page_limit == 0 || self.detector.page_limit > 1000 {
            return Err(ConfigError::ValidationError(format!(
                "page_limit must be 1-1000, got {}",
                self.detector.page_limit
            )));
        }

        if self.enrichment.market_cap_floor_usd < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "market_cap_floor_usd must be >= 0, got {}",
                self.enrichment.market_cap_floor_usd
            )));
        }

        Ok(())
    }

    /// Detection parameters in the shape the application layer consumes
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            program_address: self.solana.launchpad_program.clone(),
            window_seconds: self.detector.window_secs,
            page_limit: self.detector.page_limit,
            concurrency: self.detector.concurrency,
            ignored_mints: self
                .detector
                .ignored_mints
                .iter()
                .cloned()
                .collect::<HashSet<String>>(),
        }
    }
}

/// Parse a lookback-window preset: "1h", "6h", "24h", "7d", or raw seconds.
pub fn parse_window_preset(value: &str) -> Result<u64, ConfigError> {
    let seconds = match value {
        "1h" => 3_600,
        "6h" => 21_600,
        "24h" => 86_400,
        "7d" => 604_800,
        other => other.parse::<u64>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "window must be one of 1h/6h/24h/7d or a number of seconds, got '{}'",
                other
            ))
        })?,
    };
    if seconds == 0 {
        return Err(ConfigError::ValidationError(
            "window must be > 0 seconds".to_string(),
        ));
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[solana]
rpc_url = "https://example-rpc.invalid"

[detector]
poll_interval_secs = 120
window_secs = 7200
page_limit = 500
concurrency = 3
ignored_mints = ["So11111111111111111111111111111111111111112"]

[enrichment]
market_cap_floor_usd = 50000.0

[storage]
data_dir = "state"

[logging]
level = "debug"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.solana.rpc_url, "https://example-rpc.invalid");
        assert_eq!(config.detector.window_secs, 7200);
        assert_eq!(config.detector.concurrency, 3);
        assert_eq!(config.enrichment.market_cap_floor_usd, 50_000.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("definitely/not/here.toml").unwrap();
        assert_eq!(config.detector.poll_interval_secs, 300);
        assert_eq!(config.detector.window_secs, 3600);
        assert_eq!(config.detector.page_limit, 1000);
        assert_eq!(config.enrichment.market_cap_floor_usd, 20_000.0);
        assert_eq!(config.solana.launchpad_program, PUMP_FUN_PROGRAM);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[detector]\nwindow_secs = 600\n").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.detector.window_secs, 600);
        assert_eq!(config.detector.concurrency, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.detector.page_limit = 2000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detector.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.enrichment.market_cap_floor_usd = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_detector_config_mapping() {
        let config = Config::default();
        let detector = config.detector_config();
        assert_eq!(detector.program_address, PUMP_FUN_PROGRAM);
        assert!(detector.ignored_mints.contains(WSOL_MINT));
        assert!(detector.ignored_mints.contains(USDC_MINT));
    }

    #[test]
    fn test_window_presets() {
        assert_eq!(parse_window_preset("1h").unwrap(), 3_600);
        assert_eq!(parse_window_preset("6h").unwrap(), 21_600);
        assert_eq!(parse_window_preset("24h").unwrap(), 86_400);
        assert_eq!(parse_window_preset("7d").unwrap(), 604_800);
        assert_eq!(parse_window_preset("900").unwrap(), 900);
        assert!(parse_window_preset("2w").is_err());
        assert!(parse_window_preset("0").is_err());
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageSection {
            data_dir: "state".to_string(),
        };
        assert!(storage.history_path().ends_with("state/history.json"));
        assert!(storage.cursor_path().ends_with("state/cursor.json"));
        assert!(storage.report_path().ends_with("state/latest_report.json"));
    }
}
