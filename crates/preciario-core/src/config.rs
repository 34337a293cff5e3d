//! Application configuration management.
//!
//! Holds the sheet URL, the history and search tunables, and where local
//! data is kept. Configuration is stored at
//! `~/.config/preciario/config.json`; every field is optional in the file.
//! `PRECIARIO_SHEET_URL` and `PRECIARIO_DATA_DIR` override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "preciario";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Published CSV export of the shop's price sheet.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRZIOFgQMtPc_h5FVoQIMAcpkoyXs3vminjL7rSvr2VCLmmgykBsH1AJ13ZnBYSvg/pub?output=csv";

/// Most lookups kept in the history ledger.
pub const DEFAULT_HISTORY_CAP: usize = 20;

/// Shortest query (in characters) that also searches descriptions.
/// Shorter queries only match codes exactly.
pub const DEFAULT_MIN_PARTIAL_QUERY_LEN: usize = 4;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const SHEET_URL_ENV: &str = "PRECIARIO_SHEET_URL";
const DATA_DIR_ENV: &str = "PRECIARIO_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet_url: String,
    pub history_cap: usize,
    pub min_partial_query_len: usize,
    pub request_timeout_secs: u64,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Total bytes the local store may use; unlimited when absent.
    pub store_quota_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            history_cap: DEFAULT_HISTORY_CAP,
            min_partial_query_len: DEFAULT_MIN_PARTIAL_QUERY_LEN,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            data_dir: None,
            store_quota_bytes: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults if missing), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SHEET_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.sheet_url = url.trim().to_string();
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the snapshot, the history and the log file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.history_cap, 20);
        assert_eq!(config.min_partial_query_len, 4);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.sheet_url.ends_with("output=csv"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"history_cap": 5}"#).unwrap();
        assert_eq!(config.history_cap, 5);
        assert_eq!(config.min_partial_query_len, DEFAULT_MIN_PARTIAL_QUERY_LEN);
        assert_eq!(config.sheet_url, DEFAULT_SHEET_URL);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|name| match name {
            SHEET_URL_ENV => Some(" https://example.test/sheet.csv ".to_string()),
            DATA_DIR_ENV => Some("/tmp/preciario".to_string()),
            _ => None,
        });
        assert_eq!(config.sheet_url, "https://example.test/sheet.csv");
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/preciario"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.sheet_url, DEFAULT_SHEET_URL);
        assert!(config.data_dir.is_none());
    }
}
