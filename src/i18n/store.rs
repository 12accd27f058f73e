// SPDX-License-Identifier: MPL-2.0
//! Persistence backings for string preferences.

use super::lock_unpoisoned;
use crate::config;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Minimal named-string storage used to persist the language preference.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `name`.
    fn get_string(&self, name: &str) -> Result<Option<String>>;

    /// Stores `value` under `name`; `None` removes the entry.
    ///
    /// The write must be durable when this returns `Ok`.
    fn set_string(&self, name: &str, value: Option<&str>) -> Result<()>;
}

/// Process-local store, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    #[must_use]
    pub fn with_value(name: &str, value: &str) -> Self {
        let store = Self::default();
        lock_unpoisoned(&store.values).insert(name.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(lock_unpoisoned(&self.values).get(name).cloned())
    }

    fn set_string(&self, name: &str, value: Option<&str>) -> Result<()> {
        let mut values = lock_unpoisoned(&self.values);
        match value {
            Some(value) => values.insert(name.to_string(), value.to_string()),
            None => values.remove(name),
        };
        Ok(())
    }
}

/// Stores preferences in the `[preferences]` table of `settings.toml`.
///
/// Every write re-reads the file so other sections are preserved.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Uses the settings file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Uses `settings.toml` in `base_dir`, or in the default config directory.
    pub fn with_override(base_dir: Option<PathBuf>) -> Result<Self> {
        config::config_path_with_override(base_dir)
            .map(Self::new)
            .ok_or_else(|| {
                Error::Config("no config directory available on this platform".to_string())
            })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<config::Config> {
        if self.path.exists() {
            config::load_from_path(&self.path)
        } else {
            Ok(config::Config::default())
        }
    }
}

impl KeyValueStore for ConfigStore {
    fn get_string(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read()?.preferences.get(name).cloned())
    }

    fn set_string(&self, name: &str, value: Option<&str>) -> Result<()> {
        let _guard = lock_unpoisoned(&self.write_lock);
        // An unreadable file is reported rather than overwritten.
        let mut config = self.read()?;
        match value {
            Some(value) => config.preferences.insert(name.to_string(), value.to_string()),
            None => config.preferences.remove(name),
        };
        config::save_to_path(&config, &self.path)
    }
}
