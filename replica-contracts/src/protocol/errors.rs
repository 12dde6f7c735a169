// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaErrorKind {
    /// A volume descriptor failed validation; only that volume is excluded
    ConfigInvalid,
    /// Mount points could not be enumerated; the whole build is abandoned
    DiscoveryFailure,
    /// A directory walk hit an unreadable entry
    WalkFailure,
    /// A single link or placeholder could not be created
    LinkFailure,
    /// A requested library does not exist
    NotFound,
    InvalidInput,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct ReplicaError {
    pub kind: ReplicaErrorKind,
    pub message: String,
}

impl ReplicaError {
    pub fn new(kind: ReplicaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ReplicaErrorKind::NotFound, message)
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::new(ReplicaErrorKind::DiscoveryFailure, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replica_error_roundtrips() {
        let error = ReplicaError::not_found("library 'abc' not found");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: ReplicaError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
        assert!(json.contains("not_found"));
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = ReplicaError::discovery("mountinfo unreadable");
        assert_eq!(error.to_string(), "DiscoveryFailure: mountinfo unreadable");
    }
}
