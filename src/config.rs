use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NovaError, NovaResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub files: FilesConfig,
    pub apps: AppsConfig,
    pub currency: CurrencyConfig,
    pub web: WebConfig,
    pub shell: ShellConfig,
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    /// Shortest query that fans out to providers
    pub provider_min_query_len: usize,
    /// Query length above which a QR code result is offered
    pub qr_threshold: usize,
    /// Query length above which a QR code can no longer encode the text
    pub qr_max_length: usize,
    pub clipboard_prefix: String,
    pub record_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub roots: Vec<String>,
    /// Directory entries scanned per query, across all roots
    pub max_items: usize,
    pub max_results: usize,
    pub min_score: f64,
    pub show_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppsConfig {
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub memory_ttl_secs: u64,
    pub disk_ttl_secs: u64,
    pub fetch_timeout_ms: u64,
    pub live_timeout_ms: u64,
    /// Seconds to skip fetching after every tier failed
    pub failure_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// URL template; `{query}` is replaced with the encoded search terms
    pub search_url: String,
    pub keyword: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub flush_interval_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            provider_min_query_len: 2,
            qr_threshold: 40,
            qr_max_length: 1200,
            clipboard_prefix: "cb".to_string(),
            record_prefix: "rec".to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                "~".to_string(),
                "~/Desktop".to_string(),
                "~/Documents".to_string(),
                "~/Downloads".to_string(),
            ],
            max_items: 2000,
            max_results: 20,
            min_score: 0.4,
            show_hidden: false,
        }
    }
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self { refresh_secs: 300 }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            memory_ttl_secs: 600,
            disk_ttl_secs: 86_400,
            fetch_timeout_ms: 1500,
            live_timeout_ms: 5000,
            failure_backoff_secs: 60,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/search?q={query}".to_string(),
            keyword: "g".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: 60,
        }
    }
}

impl FilesConfig {
    /// Roots with `~` and environment variables expanded.
    pub fn expanded_roots(&self) -> Vec<PathBuf> {
        self.roots
            .iter()
            .map(|root| PathBuf::from(shellexpand::tilde(root).as_ref()))
            .collect()
    }
}

impl CurrencyConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn live_timeout(&self) -> Duration {
        Duration::from_millis(self.live_timeout_ms)
    }
}

impl AppsConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

impl ShellConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl UsageConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }
}

impl WebConfig {
    /// Fill the search template with URL-encoded terms.
    pub fn resolve_url(&self, terms: &str) -> String {
        self.search_url
            .replace("{query}", &urlencoding::encode(terms))
    }
}

impl Config {
    /// Directory holding the config file and the JSON data files
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                // Fallback: ~ is not expanded by PathBuf, so use dirs::home_dir
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("nova")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("resolve.toml")
    }

    /// Path of a data file stored next to the config (`commands.json`, ...)
    pub fn data_path(name: &str) -> PathBuf {
        Self::config_dir().join(name)
    }

    /// Load config from the default location, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`; unreadable or malformed files yield defaults
    pub fn load_from(path: &Path) -> Self {
        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to parse config");
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.validate();
        config
    }

    /// Validate and clamp config values to acceptable ranges
    pub fn validate(&mut self) {
        self.search.max_results = self.search.max_results.clamp(1, 50);
        self.search.provider_min_query_len = self.search.provider_min_query_len.max(1);

        // A QR payload must fit below the hard ceiling
        self.search.qr_max_length = self.search.qr_max_length.clamp(1, 4296);
        self.search.qr_threshold = self.search.qr_threshold.min(self.search.qr_max_length);

        self.files.max_items = self.files.max_items.clamp(1, 100_000);
        self.files.max_results = self.files.max_results.clamp(1, 200);
        self.files.min_score = self.files.min_score.clamp(0.0, 1.0);

        self.apps.refresh_secs = self.apps.refresh_secs.max(10);

        self.currency.fetch_timeout_ms = self.currency.fetch_timeout_ms.clamp(100, 30_000);
        self.currency.live_timeout_ms = self
            .currency
            .live_timeout_ms
            .clamp(self.currency.fetch_timeout_ms, 60_000);
        self.currency.failure_backoff_secs = self.currency.failure_backoff_secs.min(3600);

        self.shell.timeout_ms = self.shell.timeout_ms.clamp(100, 600_000);
        self.usage.flush_interval_secs = self.usage.flush_interval_secs.max(1);
    }

    /// Save config to the default location
    pub fn save(&self) -> NovaResult<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> NovaResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| NovaError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }
}
