use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::services::FetchPolicy;

pub const CATALOG_URL: &str = "https://swapi.info/api/starships";
pub const MIN_REQUEST_INTERVAL_MS: u64 = 5000; // minimum spacing between permitted fetches
pub const REQUEST_TIMEOUT_MS: u64 = 8000;
pub const MAX_RETRIES: u32 = 3; // retries after the first attempt
pub const RETRY_DELAY_STEP_MS: u64 = 1000;
pub const RETRY_DELAY_CAP_MS: u64 = 3000;
pub const STALE_TIME_SECS: u64 = 300; // 5 minutes
pub const GC_TIME_SECS: u64 = 1800; // 30 minutes
pub const ITEMS_PER_PAGE: usize = 10;
pub const SEARCH_MAX_LENGTH: usize = 100;
pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const FAVORITES_FILE: &str = "starwars-favorites.json";
pub const APP_DIR: &str = "starship-catalog";
pub const ENV_PREFIX: &str = "STARSHIPS";

/// Runtime settings, layered as defaults < `config.toml` < `STARSHIPS_*` env vars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub catalog_url: String,
    pub bind_addr: SocketAddr,
    /// Where favorites are persisted; `None` resolves to the user data dir.
    pub favorites_path: Option<PathBuf>,
    pub min_request_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub stale_time_secs: u64,
    pub gc_time_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_url: CATALOG_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            favorites_path: None,
            min_request_interval_ms: MIN_REQUEST_INTERVAL_MS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            max_retries: MAX_RETRIES,
            stale_time_secs: STALE_TIME_SECS,
            gc_time_secs: GC_TIME_SECS,
        }
    }
}

impl Settings {
    /// Default location of the optional settings file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Load settings from the default config file (if present) and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a source exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        settings.try_deserialize()
    }

    pub fn favorites_path(&self) -> PathBuf {
        match &self.favorites_path {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join(FAVORITES_FILE),
        }
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_retries: self.max_retries,
            stale_time: Duration::from_secs(self.stale_time_secs),
            gc_time: Duration::from_secs(self.gc_time_secs),
            ..FetchPolicy::default()
        }
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}
