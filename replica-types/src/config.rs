// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide user configuration
//!
//! Holds the shortname registry for libraries and extra directories to scan
//! alongside the mount points reported by the operating system.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the user configuration inside `$HOME`
pub const CONFIG_FILE_NAME: &str = ".replica.toml";

/// Overrides the user configuration location when set
pub const CONFIG_ENV_VAR: &str = "REPLICA_CONFIG";

/// Human-friendly name for one library identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub short: String,
    pub uuid: String,
}

impl Collection {
    pub fn new(short: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            short: short.into(),
            uuid: uuid.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default, rename = "collect")]
    pub collections: Vec<Collection>,

    #[serde(default)]
    pub additional_mountpoints: Vec<PathBuf>,
}

impl UserConfig {
    /// Location of the configuration file for the current user
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(CONFIG_FILE_NAME)
        } else {
            PathBuf::from(CONFIG_FILE_NAME)
        }
    }

    pub fn find_collection(&self, short: &str) -> Option<&Collection> {
        self.collections.iter().find(|collection| collection.short == short)
    }

    /// Registers a collection, refusing a shortname that is already taken
    pub fn add_collection(&mut self, collection: Collection) -> Result<(), String> {
        if self.find_collection(&collection.short).is_some() {
            return Err(format!(
                "collection with shortname '{}' already exists",
                collection.short
            ));
        }
        self.collections.push(collection);
        Ok(())
    }

    /// Removes a collection by shortname, returning it if it was present
    pub fn remove_collection(&mut self, short: &str) -> Option<Collection> {
        let index = self
            .collections
            .iter()
            .position(|collection| collection.short == short)?;
        Some(self.collections.remove(index))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
