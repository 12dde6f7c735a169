// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem and system-level operations for volume replication
//!
//! This crate does the work that touches the machine:
//! - Enumerating mount points
//! - Loading and validating volume descriptors
//! - Building the physical tree concurrently across scan roots
//! - Creating symlinks and placeholders between storage volumes
//! - Rendering rclone commands and locating the rclone binary
//! - Reading and writing the user configuration file

pub mod descriptor;
pub mod error;
pub mod link;
pub mod mounts;
mod persist;
pub mod physical;
pub mod rclone;
pub mod user_config;

pub use descriptor::{load_descriptor, validate, write_descriptor};
pub use error::{Result, SysError};
pub use link::{
    DestinationState, LinkReport, PLACEHOLDER_PROBE_BYTES, create_link, inspect_destination,
    link_volume, preview_volume_links,
};
pub use mounts::{FixedMounts, SystemMounts, system_mount_points};
pub use physical::{
    PhysicalTree, build_physical_tree, scan_roots, scan_volume_roots, try_build_physical_tree,
};
pub use rclone::{RCloneCli, RCLONE_TOOL, RcloneCommand, RcloneVerb};
pub use user_config::UserConfigFile;
