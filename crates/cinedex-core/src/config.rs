use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CinedexError;
use crate::models::GridSize;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `catalog.api_key`.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Base of the embeddable player, without trailing slash.
    pub embed_base: String,
    /// Minutes assumed for an episode when the catalog has no runtime.
    pub default_tv_runtime: u32,
    #[serde(default = "default_movie_runtime")]
    pub default_movie_runtime: u32,
    /// Progress recorded when playback starts, in percent.
    pub initial_progress: u8,
}

fn default_movie_runtime() -> u32 {
    120
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub grid_size: GridSize,
}

impl AppConfig {
    /// Load config: user file if it exists, otherwise built-in defaults.
    pub fn load() -> Result<Self, CinedexError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::from_toml(&user_str)
        } else {
            Self::from_toml(DEFAULT_CONFIG)
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, CinedexError> {
        toml::from_str(s).map_err(|e| CinedexError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), CinedexError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CinedexError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Effective API key: environment first, then the config file.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.catalog.api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the preferences database file.
    pub fn db_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("cinedex.db"))
            .unwrap_or_else(|| PathBuf::from("cinedex.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, CinedexError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Directory for rotated log files.
    pub fn log_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "cinedex")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
