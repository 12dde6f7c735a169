// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use replica_types::UserConfig;

use crate::ReplicaError;

/// Enumerates the root paths of every mounted filesystem on this machine
pub trait MountPointSource: Send + Sync {
    fn mount_points(&self) -> Result<Vec<PathBuf>, ReplicaError>;
}

/// Read access to the user's configuration
pub trait UserConfigSource: Send + Sync {
    /// Directories scanned in addition to the reported mount points
    fn additional_mount_points(&self) -> Result<Vec<PathBuf>, ReplicaError>;

    /// Library identifier registered under `short`, if any
    fn resolve_shortname(&self, short: &str) -> Result<Option<String>, ReplicaError>;
}

impl UserConfigSource for UserConfig {
    fn additional_mount_points(&self) -> Result<Vec<PathBuf>, ReplicaError> {
        Ok(self.additional_mountpoints.clone())
    }

    fn resolve_shortname(&self, short: &str) -> Result<Option<String>, ReplicaError> {
        Ok(self
            .find_collection(short)
            .map(|collection| collection.uuid.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replica_types::Collection;

    #[test]
    fn user_config_answers_as_a_source() {
        let config = UserConfig {
            collections: vec![Collection::new("photos", "lib-1")],
            additional_mountpoints: vec![PathBuf::from("/srv")],
        };

        assert_eq!(
            config.additional_mount_points().expect("extra mounts"),
            vec![PathBuf::from("/srv")]
        );
        assert_eq!(
            config.resolve_shortname("photos").expect("lookup"),
            Some("lib-1".to_string())
        );
        assert_eq!(config.resolve_shortname("music").expect("lookup"), None);
    }
}
