use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use crate::shared::dataset::{DatasetKind, PatchWindow};
use std::path::PathBuf;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Remote endpoints consumed by the sync core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `{count, version}` change detection
    Version,
    /// Full dataset
    Snapshot,
    /// Recently changed records
    Patch,
    /// Single record write
    Update,
}

impl Endpoint {
    fn path(&self) -> &'static str {
        match self {
            Endpoint::Version => "count",
            Endpoint::Snapshot => "base",
            Endpoint::Patch => "patch",
            Endpoint::Update => "update",
        }
    }
}

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        let app = AppConfig::builder()
            .apply_env()
            .build()
            .unwrap_or_default();
        Self { app }
    }
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_app(app: AppConfig) -> Self {
        Self { app }
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Set the session cookie
    pub fn set_session_cookie(&mut self, cookie: Option<String>) {
        self.app.session_cookie = cookie;
    }

    /// Get the session cookie
    pub fn session_cookie(&self) -> Option<&str> {
        self.app.session_cookie.as_deref()
    }

    /// Get the full URL for an API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url().trim_end_matches('/'), path)
    }

    /// Full URL of a dataset endpoint
    pub fn endpoint_url(&self, kind: DatasetKind, endpoint: Endpoint) -> String {
        self.api_url(&format!("/api/{}/{}", kind.path_segment(), endpoint.path()))
    }

    pub fn server_url(&self) -> &str {
        self.app.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn patch_window(&self, kind: DatasetKind) -> PatchWindow {
        self.app.patch_window(kind)
    }

    /// SQLite cache location, defaulting to the platform data directory
    pub fn cache_path(&self) -> PathBuf {
        self.app.cache_path.clone().unwrap_or_else(|| {
            let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
            path.push("disconnect-sync");
            path.push("cache.db");
            path
        })
    }
}
