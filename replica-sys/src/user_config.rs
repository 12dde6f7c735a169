// SPDX-License-Identifier: GPL-3.0-only

//! On-disk store for [`UserConfig`]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use replica_contracts::{ReplicaError, UserConfigSource};
use replica_types::UserConfig;
use tracing::debug;

use crate::error::{Result, SysError};
use crate::persist::write_atomic;

/// User configuration backed by a TOML file, read on every request
#[derive(Debug, Clone)]
pub struct UserConfigFile {
    path: PathBuf,
}

impl Default for UserConfigFile {
    fn default() -> Self {
        Self::new(UserConfig::default_path())
    }
}

impl UserConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty configuration
    pub fn load(&self) -> Result<UserConfig> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("No user config at {:?}, using defaults", self.path);
                return Ok(UserConfig::default());
            }
            Err(error) => {
                return Err(SysError::UserConfig(format!(
                    "failed to read {:?}: {}",
                    self.path, error
                )));
            }
        };

        UserConfig::from_toml_str(&raw).map_err(|error| {
            SysError::UserConfig(format!("failed to decode {:?}: {}", self.path, error))
        })
    }

    pub fn save(&self, config: &UserConfig) -> Result<()> {
        let raw = config.to_toml_string().map_err(|error| {
            SysError::UserConfig(format!("failed to encode config: {}", error))
        })?;
        write_atomic(&self.path, raw.as_bytes())
    }
}

impl UserConfigSource for UserConfigFile {
    fn additional_mount_points(&self) -> std::result::Result<Vec<PathBuf>, ReplicaError> {
        Ok(self.load()?.additional_mountpoints)
    }

    fn resolve_shortname(&self, short: &str) -> std::result::Result<Option<String>, ReplicaError> {
        let config = self.load()?;
        Ok(config
            .find_collection(short)
            .map(|collection| collection.uuid.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_types::Collection;

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = UserConfigFile::new(dir.path().join("absent.toml"));
        assert_eq!(store.load().expect("load"), UserConfig::default());
    }

    #[test]
    fn saved_config_is_read_back_through_the_source_trait() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = UserConfigFile::new(dir.path().join(".replica.toml"));

        let mut config = UserConfig::default();
        config
            .add_collection(Collection::new("music", "lib-music"))
            .expect("add collection");
        config.additional_mountpoints.push(PathBuf::from("/srv/extra"));
        store.save(&config).expect("save");

        assert_eq!(store.load().expect("load"), config);
        assert_eq!(
            store.resolve_shortname("music").expect("resolve"),
            Some("lib-music".to_string())
        );
        assert_eq!(
            store.additional_mount_points().expect("extras"),
            vec![PathBuf::from("/srv/extra")]
        );
        assert!(!dir.path().join(".replica.toml.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[[collect]\nshort=").expect("write bad config");

        let store = UserConfigFile::new(&path);
        assert!(matches!(store.load(), Err(SysError::UserConfig(_))));
        assert!(store.resolve_shortname("x").is_err());
    }
}
