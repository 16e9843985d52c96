//! Application configuration module
//!
//! Configuration is read from an optional TOML file, then overridden by
//! environment variables, then validated:
//!
//! ```toml
//! server_url = "https://ledger.example.org"
//! cache_path = "/var/lib/disconnect-sync/cache.db"
//! refresh_interval_secs = 300
//!
//! [retry]
//! max_attempts = 3
//! delay_ms = 5000
//!
//! [timings]
//! found_delay_ms = 800
//! updated_display_ms = 4000
//! unchanged_display_ms = 2000
//!
//! [patch_windows]
//! consumers = "48h"
//! deemed_visits = "today"
//! ```

use crate::shared::dataset::{DatasetKind, PatchWindow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `server_url`
pub const ENV_SERVER_URL: &str = "SYNC_SERVER_URL";
/// Environment variable overriding `cache_path`
pub const ENV_CACHE_PATH: &str = "SYNC_CACHE_PATH";
/// Environment variable overriding `session_cookie`
pub const ENV_SESSION_COOKIE: &str = "SYNC_SESSION_COOKIE";

/// Write retry policy settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, first one included
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 5_000,
        }
    }
}

/// Status display delays of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Time `found` stays visible before the snapshot starts
    pub found_delay_ms: u64,
    /// Time `updated` stays visible before returning to `idle`
    pub updated_display_ms: u64,
    /// Time `checking` stays visible when nothing changed
    pub unchanged_display_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            found_delay_ms: 800,
            updated_display_ms: 4_000,
            unchanged_display_ms: 2_000,
        }
    }
}

impl TimingSettings {
    /// No display delays at all
    pub fn immediate() -> Self {
        Self {
            found_delay_ms: 0,
            updated_display_ms: 0,
            unchanged_display_ms: 0,
        }
    }

    pub fn found_delay(&self) -> Duration {
        Duration::from_millis(self.found_delay_ms)
    }

    pub fn updated_display(&self) -> Duration {
        Duration::from_millis(self.updated_display_ms)
    }

    pub fn unchanged_display(&self) -> Duration {
        Duration::from_millis(self.unchanged_display_ms)
    }
}

/// Raw patch window strings, parsed during validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct PatchWindowSettings {
    consumers: String,
    deemed_visits: String,
}

impl Default for PatchWindowSettings {
    fn default() -> Self {
        Self {
            consumers: PatchWindow::default_for(DatasetKind::Consumers).to_string(),
            deemed_visits: PatchWindow::default_for(DatasetKind::DeemedVisits).to_string(),
        }
    }
}

/// On-disk representation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server_url: Option<String>,
    cache_path: Option<PathBuf>,
    session_cookie: Option<String>,
    request_timeout_secs: Option<u64>,
    refresh_interval_secs: Option<u64>,
    retry: RetrySettings,
    timings: TimingSettings,
    patch_windows: PatchWindowSettings,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// SQLite cache file; platform data dir when absent
    pub cache_path: Option<PathBuf>,
    /// Session cookie forwarded to every request
    pub session_cookie: Option<String>,
    /// HTTP client timeout; none when absent
    pub request_timeout: Option<Duration>,
    /// Periodic refresh interval; on-demand only when absent
    pub refresh_interval: Option<Duration>,
    pub retry: RetrySettings,
    pub timings: TimingSettings,
    pub consumers_window: PatchWindow,
    pub deemed_visits_window: PatchWindow,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            cache_path: None,
            session_cookie: None,
            request_timeout: None,
            refresh_interval: None,
            retry: RetrySettings::default(),
            timings: TimingSettings::default(),
            consumers_window: PatchWindow::default_for(DatasetKind::Consumers),
            deemed_visits_window: PatchWindow::default_for(DatasetKind::DeemedVisits),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::builder().apply_file(file)?.build()
    }

    /// Read a TOML file, apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(path) = path {
            let source = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
            let file: FileConfig =
                toml::from_str(&source).map_err(|e| ConfigError::Parse(e.to_string()))?;
            builder = builder.apply_file(file)?;
        }
        builder.apply_env().build()
    }

    /// Patch window configured for a dataset
    pub fn patch_window(&self, kind: DatasetKind) -> PatchWindow {
        match kind {
            DatasetKind::Consumers => self.consumers_window,
            DatasetKind::DeemedVisits => self.deemed_visits_window,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.refresh_interval == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_secs",
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = Some(url.into());
        self
    }

    /// Set the cache file location
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = Some(path.into());
        self
    }

    /// Set the session cookie
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.config.session_cookie = Some(cookie.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval = Some(interval);
        self
    }

    pub fn retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.config.retry = RetrySettings {
            max_attempts,
            delay_ms: delay.as_millis() as u64,
        };
        self
    }

    pub fn timings(mut self, timings: TimingSettings) -> Self {
        self.config.timings = timings;
        self
    }

    pub fn patch_window(mut self, kind: DatasetKind, window: PatchWindow) -> Self {
        match kind {
            DatasetKind::Consumers => self.config.consumers_window = window,
            DatasetKind::DeemedVisits => self.config.deemed_visits_window = window,
        }
        self
    }

    fn apply_file(mut self, file: FileConfig) -> Result<Self, ConfigError> {
        if let Some(url) = file.server_url {
            self.config.server_url = Some(url);
        }
        if let Some(path) = file.cache_path {
            self.config.cache_path = Some(path);
        }
        if let Some(cookie) = file.session_cookie {
            self.config.session_cookie = Some(cookie);
        }
        self.config.request_timeout = file.request_timeout_secs.map(Duration::from_secs);
        self.config.refresh_interval = file.refresh_interval_secs.map(Duration::from_secs);
        self.config.retry = file.retry;
        self.config.timings = file.timings;
        self.config.consumers_window = parse_window("patch_windows.consumers", &file.patch_windows.consumers)?;
        self.config.deemed_visits_window =
            parse_window("patch_windows.deemed_visits", &file.patch_windows.deemed_visits)?;
        Ok(self)
    }

    /// Apply `SYNC_*` environment overrides
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_SERVER_URL) {
            self.config.server_url = Some(url);
        }
        if let Ok(path) = std::env::var(ENV_CACHE_PATH) {
            self.config.cache_path = Some(PathBuf::from(path));
        }
        if let Ok(cookie) = std::env::var(ENV_SESSION_COOKIE) {
            self.config.session_cookie = Some(cookie);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn parse_window(field: &'static str, raw: &str) -> Result<PatchWindow, ConfigError> {
    raw.parse::<PatchWindow>()
        .map_err(|message| ConfigError::InvalidValue { field, message })
}

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config: {0}")]
    Io(String),
}
