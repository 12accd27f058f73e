// SPDX-License-Identifier: MPL-2.0
//! This module handles the library's configuration, including loading and saving
//! it to a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[localization]` - Default table, default bundle, fallback language, resources
//! - `[preferences]` - Free-form string pairs; the selected language lives here
//!
//! # Path Resolution
//!
//! The config file location can be customized for testing or portable deployments:
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `REACTIVE_L10N_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use reactive_l10n::config::{self, Config, SPECIFIED_LANGUAGE_KEY};
//!
//! // Load existing configuration (returns tuple with optional warning)
//! let (mut config, _warning) = config::load();
//!
//! // Select French explicitly
//! config
//!     .preferences
//!     .insert(SPECIFIED_LANGUAGE_KEY.to_string(), "fr".to_string());
//!
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;
pub mod paths;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

// =============================================================================
// Section Structs
// =============================================================================

/// Lookup defaults and resource locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalizationConfig {
    /// Table used when a lookup key does not name one.
    #[serde(default = "default_table")]
    pub default_table: String,

    /// Bundle used when a lookup key does not name one.
    #[serde(default = "default_bundle")]
    pub default_bundle: String,

    /// Language served when negotiation finds no better match (e.g., "en-US").
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,

    /// Extra directory of `<table>/<locale>.ftl` files, loaded into the default bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources_dir: Option<PathBuf>,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            default_table: default_table(),
            default_bundle: default_bundle(),
            fallback_language: default_fallback_language(),
            resources_dir: None,
        }
    }
}

// =============================================================================
// Main Config Struct (Sectioned)
// =============================================================================

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Lookup defaults and resource locations.
    #[serde(default)]
    pub localization: LocalizationConfig,

    /// Persisted string preferences, keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<String, String>,
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_bundle() -> String {
    DEFAULT_BUNDLE.to_string()
}

fn default_fallback_language() -> String {
    DEFAULT_FALLBACK_LANGUAGE.to_string()
}

// =============================================================================
// Config Path Resolution
// =============================================================================

/// Returns the config file path with an optional directory override.
pub fn config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load Functions
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning message explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "falling back to default config");
                    return (
                        Config::default(),
                        Some(format!("Failed to load {}: {}", path.display(), error)),
                    );
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

// =============================================================================
// Save Functions
// =============================================================================

/// Saves the configuration to the default path.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    match config_path_with_override(base_dir) {
        Some(path) => save_to_path(config, &path),
        None => Err(Error::Config(
            "no config directory available on this platform".to_string(),
        )),
    }
}

/// Saves configuration to a specific path.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
