//! Application configuration.
//!
//! The defaults live in `config/default.toml` and are compiled in. Setting
//! `COLOR_WORLD_CONFIG` replaces them with a file of the same layout, and
//! the image service key is only ever read from
//! `COLOR_WORLD_STREETVIEW_KEY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_world_geo_index::cities::{self, City};
use color_world_navigation::NavigationConfig;
use serde::{Deserialize, Serialize};

use crate::paths;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable pointing at a replacement config file.
pub const CONFIG_ENV: &str = "COLOR_WORLD_CONFIG";

/// Environment variable holding the image service key.
pub const STREETVIEW_KEY_ENV: &str = "COLOR_WORLD_STREETVIEW_KEY";

/// Errors from reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// `start_city` names a city that is not in the registry.
    #[error("Unknown start city '{name}'")]
    UnknownCity {
        /// The configured name.
        name: String,
    },

    /// A setting is out of range.
    #[error("Invalid setting {field}: {message}")]
    Invalid {
        /// Dotted setting name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Input data locations, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Sample point CSV.
    pub samples: PathBuf,
    /// Elevation JSON; skipped when absent or missing on disk.
    pub elevations: Option<PathBuf>,
    /// Directory of cached street-level images for offline sampling.
    pub image_cache: Option<PathBuf>,
}

/// Image service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// URL with `{lat}`, `{lon}` and `{key}` placeholders.
    pub url_template: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
    /// Service key, filled from the environment only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl RemoteConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// History settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per place.
    pub capacity: usize,
}

/// Window and map settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub window_width: f64,
    pub window_height: f64,
    pub zoom: f64,
}

impl DisplayConfig {
    /// Map surface size derived from the window width.
    #[must_use]
    pub fn map_size(&self) -> (f64, f64) {
        (self.window_width * 0.45, self.window_width * 0.5)
    }
}

/// Everything read at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Starting city name; random when `None`.
    pub start_city: Option<String>,
    pub data: DataConfig,
    pub remote: RemoteConfig,
    pub navigation: NavigationConfig,
    pub history: HistoryConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Loads the config named by `COLOR_WORLD_CONFIG`, or the embedded
    /// defaults, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path))?,
            None => Self::from_toml(DEFAULT_CONFIG)?,
        };

        config.remote.api_key = std::env::var(STREETVIEW_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if config.remote.api_key.is_none() {
            log::warn!("{STREETVIEW_KEY_ENV} is not set; online sampling will be refused by the image service");
        }

        Ok(config)
    }

    /// The embedded defaults, without environment overrides.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Using config {}", path.display());
        Self::from_toml(&text)
    }

    /// Parses and validates a config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is invalid or a value is out of
    /// range.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history.capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if self.display.window_width <= 0.0 || self.display.window_height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "display",
                message: "window size must be positive".to_string(),
            });
        }
        if let Some(name) = &self.start_city
            && cities::city_by_name(name).is_none()
        {
            return Err(ConfigError::UnknownCity { name: name.clone() });
        }
        Ok(())
    }

    /// The configured starting city, or a random one from the registry.
    ///
    /// # Panics
    ///
    /// Panics if the city registry is empty.
    #[must_use]
    pub fn start_city(&self) -> City {
        use rand::seq::IndexedRandom;

        self.start_city
            .as_deref()
            .and_then(cities::city_by_name)
            .unwrap_or_else(|| {
                cities::all_cities()
                    .choose(&mut rand::rng())
                    .cloned()
                    .expect("city registry is empty")
            })
    }

    /// Absolute path of the sample CSV.
    #[must_use]
    pub fn samples_path(&self) -> PathBuf {
        paths::resolve_in(&paths::data_dir(), &self.data.samples)
    }

    /// Absolute path of the elevation table, if configured.
    #[must_use]
    pub fn elevations_path(&self) -> Option<PathBuf> {
        self.data
            .elevations
            .as_deref()
            .map(|p| paths::resolve_in(&paths::data_dir(), p))
    }

    /// Absolute path of the image cache directory, if configured.
    #[must_use]
    pub fn image_cache_path(&self) -> Option<PathBuf> {
        self.data
            .image_cache
            .as_deref()
            .map(|p| paths::resolve_in(&paths::data_dir(), p))
    }
}
