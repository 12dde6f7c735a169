// SPDX-License-Identifier: GPL-3.0-only

//! Replication plans rendered as rclone command lines
//!
//! - **append**: every buffer copied into every storage of its library
//! - **sync**: every unordered pair of storages copied both ways
//! - **drop**: dry-run deletes of given relative paths on every volume
//!
//! A copy always uses the destination volume's rclone arguments.

use std::path::{Component, Path};

use replica_contracts::{ReplicaError, ReplicaErrorKind};
use replica_sys::RcloneCommand;
use tracing::info;

use crate::logical::{Library, LogicalTree, Volume};

/// Flags appended to every generated delete so the script is safe to run as is
pub const DROP_SAFETY_ARGUMENTS: &str = "--dry-run";

/// Copy from `source` to `destination`, or `None` when both are the same path
pub fn copy_command(source: &Volume, destination: &Volume) -> Option<RcloneCommand> {
    if source.base_path == destination.base_path {
        return None;
    }

    Some(RcloneCommand::copy(
        &source.base_path,
        &destination.base_path,
        destination.descriptor.rclone_arguments(),
    ))
}

pub fn append_commands(library: &Library) -> Vec<RcloneCommand> {
    if library.buffers.is_empty() || library.storages.is_empty() {
        info!(
            "Library '{}' is missing buffer or storage volumes, no append commands",
            library.id
        );
        return Vec::new();
    }

    library
        .buffers
        .iter()
        .flat_map(|buffer| {
            library
                .storages
                .iter()
                .filter_map(move |storage| copy_command(buffer, storage))
        })
        .collect()
}

pub fn sync_commands(library: &Library) -> Vec<RcloneCommand> {
    let storages = &library.storages;
    if storages.len() < 2 {
        info!(
            "Library '{}' needs at least 2 storage volumes for sync, no sync commands",
            library.id
        );
        return Vec::new();
    }

    let mut commands = Vec::new();
    // Each unordered pair once, emitting both directions together.
    for (index, first) in storages.iter().enumerate() {
        for second in &storages[index + 1..] {
            commands.extend(copy_command(first, second));
            commands.extend(copy_command(second, first));
        }
    }
    commands
}

/// Dry-run deletes for each relative path on every volume, buffers first
pub fn drop_commands<P: AsRef<Path>>(
    library: &Library,
    relative_paths: &[P],
) -> Result<Vec<RcloneCommand>, ReplicaError> {
    for relative in relative_paths {
        check_relative(relative.as_ref())?;
    }

    Ok(library
        .volumes()
        .flat_map(|volume| {
            relative_paths.iter().map(move |relative| {
                RcloneCommand::delete(
                    &volume.base_path.join(relative.as_ref()),
                    DROP_SAFETY_ARGUMENTS,
                )
            })
        })
        .collect())
}

fn check_relative(path: &Path) -> Result<(), ReplicaError> {
    let escapes = path.as_os_str().is_empty()
        || path
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

    if escapes {
        return Err(ReplicaError::new(
            ReplicaErrorKind::InvalidInput,
            format!("{:?} must be a relative path inside the volume", path),
        ));
    }
    Ok(())
}

fn render(commands: Vec<RcloneCommand>) -> Vec<String> {
    commands.iter().map(RcloneCommand::render).collect()
}

pub fn build_append(tree: &LogicalTree, library_id: &str) -> Result<Vec<String>, ReplicaError> {
    Ok(render(append_commands(tree.require(library_id)?)))
}

pub fn build_append_all(tree: &LogicalTree) -> Vec<String> {
    tree.libraries()
        .flat_map(|library| render(append_commands(library)))
        .collect()
}

pub fn build_sync(tree: &LogicalTree, library_id: &str) -> Result<Vec<String>, ReplicaError> {
    Ok(render(sync_commands(tree.require(library_id)?)))
}

pub fn build_sync_all(tree: &LogicalTree) -> Vec<String> {
    tree.libraries()
        .flat_map(|library| render(sync_commands(library)))
        .collect()
}

pub fn build_drop<P: AsRef<Path>>(
    tree: &LogicalTree,
    library_id: &str,
    relative_paths: &[P],
) -> Result<Vec<String>, ReplicaError> {
    let library = tree.require(library_id)?;
    Ok(render(drop_commands(library, relative_paths)?))
}
