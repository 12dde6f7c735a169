// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data models for volume discovery and replication planning
//!
//! This crate defines the types shared by every layer of the workspace:
//!
//! - **replica-sys**: loads `VolumeDescriptor`s from disk and reads `UserConfig`
//! - **replica-library**: groups descriptors into libraries and plans copies
//! - **replica-app**: renders these types for the command line
//!
//! Nothing here touches the filesystem except the TOML helpers, which only
//! convert between strings and values.

pub mod config;
pub mod scan;
pub mod volume;

pub use config::{Collection, CONFIG_ENV_VAR, CONFIG_FILE_NAME, UserConfig};
pub use scan::{DESCRIPTOR_FILE_NAME, PLACEHOLDER_MARKER, ScanConfig, VOLUMES_DIR_NAME};
pub use volume::{
    AdvancedSection, LibrarySection, LinkMode, VolumeDescriptor, VolumeMode, VolumeSection,
};
