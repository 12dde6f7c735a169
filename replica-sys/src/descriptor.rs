// SPDX-License-Identifier: GPL-3.0-only

//! Loading and validation of `volume.toml` descriptors

use std::fs;
use std::path::Path;

use replica_types::{LinkMode, VolumeDescriptor, VolumeMode};
use tracing::info;

use crate::error::{Result, SysError};
use crate::persist::write_atomic;

/// Checks that a parsed descriptor is usable.
///
/// `library.uuid` must be non-empty and `volume.mode` must be exactly
/// `storage` or `buffer`. A non-empty `link_create` must name a known link
/// mode. Notes and rclone arguments are free-form.
pub fn validate(descriptor: &VolumeDescriptor) -> std::result::Result<(), String> {
    if descriptor.library_id().is_empty() {
        return Err("volume config missing required 'library.uuid'".to_string());
    }

    descriptor.volume.mode.parse::<VolumeMode>()?;

    if !descriptor.advanced.link_create.is_empty() {
        descriptor.advanced.link_create.parse::<LinkMode>()?;
    }

    Ok(())
}

/// Reads, parses and validates one descriptor file
pub fn load_descriptor(path: &Path) -> Result<VolumeDescriptor> {
    let raw = fs::read_to_string(path).map_err(|error| SysError::ConfigParse {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    let descriptor =
        VolumeDescriptor::from_toml_str(&raw).map_err(|error| SysError::ConfigParse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

    validate(&descriptor).map_err(|reason| SysError::ConfigInvalid {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(descriptor)
}

/// Writes a descriptor, creating parent directories as needed
pub fn write_descriptor(path: &Path, descriptor: &VolumeDescriptor) -> Result<()> {
    let raw = descriptor
        .to_toml_string()
        .map_err(|error| SysError::ConfigParse {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

    write_atomic(path, raw.as_bytes())?;
    info!("Wrote volume descriptor {:?}", path);
    Ok(())
}
