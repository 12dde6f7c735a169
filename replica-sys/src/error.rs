// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use replica_contracts::{ReplicaError, ReplicaErrorKind};
use thiserror::Error;

/// Error types for filesystem and system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid volume config {path:?}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("failed to parse {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("mount point discovery failed: {0}")]
    Discovery(String),

    #[error("walk failed at {path:?}: {reason}")]
    Walk { path: PathBuf, reason: String },

    #[error("link failed at {path:?}: {reason}")]
    Link { path: PathBuf, reason: String },

    #[error("invalid link creation mode: {0}")]
    InvalidLinkMode(String),

    #[error("rclone binary not found in PATH")]
    RcloneNotFound,

    #[error("user config error: {0}")]
    UserConfig(String),

    #[error("thread pool initialization failed: {0}")]
    ThreadPoolBuild(String),
}

impl SysError {
    pub fn kind(&self) -> ReplicaErrorKind {
        match self {
            SysError::ConfigInvalid { .. } | SysError::ConfigParse { .. } => {
                ReplicaErrorKind::ConfigInvalid
            }
            SysError::Discovery(_) => ReplicaErrorKind::DiscoveryFailure,
            SysError::Walk { .. } => ReplicaErrorKind::WalkFailure,
            SysError::Link { .. } => ReplicaErrorKind::LinkFailure,
            SysError::InvalidLinkMode(_) => ReplicaErrorKind::InvalidInput,
            SysError::Io(_)
            | SysError::RcloneNotFound
            | SysError::UserConfig(_)
            | SysError::ThreadPoolBuild(_) => ReplicaErrorKind::Internal,
        }
    }
}

impl From<SysError> for ReplicaError {
    fn from(err: SysError) -> Self {
        ReplicaError::new(err.kind(), err.to_string())
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_replica_error_keeping_the_kind() {
        let error = SysError::Link {
            path: PathBuf::from("/s2/a.mkv"),
            reason: "permission denied".to_string(),
        };
        let converted: ReplicaError = error.into();
        assert_eq!(converted.kind, ReplicaErrorKind::LinkFailure);
        assert!(converted.message.contains("/s2/a.mkv"));

        let converted: ReplicaError = SysError::Discovery("no /proc".to_string()).into();
        assert_eq!(converted.kind, ReplicaErrorKind::DiscoveryFailure);
    }
}
