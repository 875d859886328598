//! Client configuration.
//!
//! Values are resolved with this precedence, highest first:
//! 1. Explicit overrides (command-line flags)
//! 2. Environment: `NOTEKEEPER_API_URL`, `NOTEKEEPER_STORE`
//! 3. `<config_dir>/notekeeper/config.json`
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::Deserialize;

use crate::api::DEFAULT_URL;
use crate::view::{SortBy, SortOrder};

const APP_NAME: &str = "notekeeper";
const CONFIG_FILE: &str = "config.json";

pub const API_URL_ENV: &str = "NOTEKEEPER_API_URL";
pub const STORE_ENV: &str = "NOTEKEEPER_STORE";

/// Settings persisted in the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub default_sort: Option<SortBy>,
    #[serde(default)]
    pub default_order: Option<SortOrder>,
}

impl FileConfig {
    /// Load from the user's config directory.
    /// Returns defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        match get_config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    /// `None` means the platform default from [`crate::storage::default_path`].
    pub store_path: Option<PathBuf>,
    pub default_sort: SortBy,
    pub default_order: SortOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_URL.to_string(),
            store_path: None,
            default_sort: SortBy::default(),
            default_order: SortOrder::default(),
        }
    }
}

/// Command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Config {
    pub fn load(overrides: Overrides) -> Self {
        Self::resolve(
            overrides,
            FileConfig::load(),
            std::env::var(API_URL_ENV).ok(),
            std::env::var(STORE_ENV).ok().map(PathBuf::from),
        )
    }

    /// Merge the layers. Empty strings count as unset.
    pub fn resolve(
        overrides: Overrides,
        file: FileConfig,
        env_api_url: Option<String>,
        env_store: Option<PathBuf>,
    ) -> Self {
        let defaults = Self::default();
        let set = |value: Option<String>| value.filter(|url| !url.trim().is_empty());
        let api_url = set(overrides.api_url)
            .or_else(|| set(env_api_url))
            .or_else(|| set(file.api_url))
            .unwrap_or(defaults.api_url);

        Self {
            api_url,
            store_path: overrides.store_path.or(env_store).or(file.store_path),
            default_sort: file.default_sort.unwrap_or(defaults.default_sort),
            default_order: file.default_order.unwrap_or(defaults.default_order),
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
