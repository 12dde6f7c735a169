// SPDX-License-Identifier: GPL-3.0-only

//! Link engine for one (source, destination) pair of storage volumes
//!
//! Every regular file under the source gets a symlink or a placeholder at the
//! same relative path under the destination, unless the destination already
//! holds real content there. Symlinks and placeholder files at the destination
//! count as absent and are replaced.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use replica_types::{LinkMode, PLACEHOLDER_MARKER};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SysError};

/// Files larger than this are never treated as placeholders, and no more than
/// this many bytes are read when probing one.
pub const PLACEHOLDER_PROBE_BYTES: u64 = 64;

/// What currently sits at a destination path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationState {
    Absent,
    Symlink,
    Placeholder,
    /// Real content that must not be touched
    Occupied,
}

impl DestinationState {
    pub fn is_replaceable(self) -> bool {
        !matches!(self, DestinationState::Occupied)
    }
}

/// Outcome of linking one volume pair
#[derive(Debug, Default)]
pub struct LinkReport {
    /// New links where nothing existed
    pub created: Vec<PathBuf>,
    /// Existing symlinks or placeholders that were rewritten
    pub replaced: Vec<PathBuf>,
    /// Destination paths left alone because they hold real files
    pub duplicates: Vec<PathBuf>,
    /// Per-path walk and link failures; the walk continued past each
    pub failures: Vec<SysError>,
}

impl LinkReport {
    pub fn linked(&self) -> usize {
        self.created.len() + self.replaced.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Classifies the entry at `path` without following symlinks
pub fn inspect_destination(path: &Path) -> io::Result<DestinationState> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Ok(DestinationState::Absent);
        }
        Err(error) => return Err(error),
    };

    if metadata.file_type().is_symlink() {
        return Ok(DestinationState::Symlink);
    }

    if metadata.is_file()
        && metadata.len() <= PLACEHOLDER_PROBE_BYTES
        && is_placeholder_file(path)?
    {
        return Ok(DestinationState::Placeholder);
    }

    Ok(DestinationState::Occupied)
}

fn is_placeholder_file(path: &Path) -> io::Result<bool> {
    let mut buffer = Vec::with_capacity(PLACEHOLDER_PROBE_BYTES as usize);
    File::open(path)?
        .take(PLACEHOLDER_PROBE_BYTES)
        .read_to_end(&mut buffer)?;

    Ok(std::str::from_utf8(&buffer).is_ok_and(|content| content.trim() == PLACEHOLDER_MARKER))
}

/// Links every regular file of `source` into `destination`.
///
/// `LinkMode::None` does nothing. Fails only when the destination root cannot
/// be created or the source root cannot be read; per-file problems are
/// collected in the report.
pub fn link_volume(source: &Path, destination: &Path, mode: LinkMode) -> Result<LinkReport> {
    run(source, destination, mode, true)
}

/// Same walk as [`link_volume`], reporting what would change without writing
pub fn preview_volume_links(
    source: &Path,
    destination: &Path,
    mode: LinkMode,
) -> Result<LinkReport> {
    run(source, destination, mode, false)
}

fn run(source: &Path, destination: &Path, mode: LinkMode, apply: bool) -> Result<LinkReport> {
    let mut report = LinkReport::default();

    if mode.is_none() {
        return Ok(report);
    }

    let source_metadata = fs::metadata(source).map_err(|error| SysError::Walk {
        path: source.to_path_buf(),
        reason: error.to_string(),
    })?;
    if !source_metadata.is_dir() {
        return Err(SysError::Walk {
            path: source.to_path_buf(),
            reason: "source is not a directory".to_string(),
        });
    }

    if apply {
        fs::create_dir_all(destination).map_err(|error| SysError::Link {
            path: destination.to_path_buf(),
            reason: format!("failed to create destination directory: {error}"),
        })?;
    }

    let source_root = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());

    for entry in WalkDir::new(&source_root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| source_root.clone());
                warn!("Error walking {:?}: {}", path, error);
                report.failures.push(SysError::Walk {
                    path,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(&source_root) else {
            continue;
        };
        let target = destination.join(relative);

        let state = match inspect_destination(&target) {
            Ok(state) => state,
            Err(error) => {
                warn!("Failed to inspect {:?}: {}", target, error);
                report.failures.push(SysError::Link {
                    path: target,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        if !state.is_replaceable() {
            info!("File {:?} already exists at destination, skipping", target);
            report.duplicates.push(target);
            continue;
        }

        if apply {
            if let Err(error) = create_link(entry.path(), &target, mode) {
                warn!("{}", error);
                report.failures.push(error);
                continue;
            }
        } else {
            debug!("[DRY RUN] Would {} {:?} -> {:?}", mode, target, entry.path());
        }

        if state == DestinationState::Absent {
            report.created.push(target);
        } else {
            report.replaced.push(target);
        }
    }

    Ok(report)
}

/// Removes whatever is at `destination` and writes a fresh link or placeholder
pub fn create_link(source: &Path, destination: &Path, mode: LinkMode) -> Result<()> {
    let link_error = |reason: String| SysError::Link {
        path: destination.to_path_buf(),
        reason,
    };

    if mode.is_none() {
        return Err(SysError::InvalidLinkMode(mode.to_string()));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| link_error(format!("failed to create parent directory: {error}")))?;
    }

    match fs::remove_file(destination) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(link_error(format!("failed to remove existing entry: {error}"))),
    }

    match mode {
        LinkMode::Symlink => {
            make_symlink(source, destination).map_err(|error| {
                link_error(format!("failed to create symlink to {:?}: {error}", source))
            })?;
            debug!("Created symlink: {:?} -> {:?}", destination, source);
        }
        LinkMode::Placeholder => {
            fs::write(destination, PLACEHOLDER_MARKER)
                .map_err(|error| link_error(format!("failed to create placeholder: {error}")))?;
            debug!("Created placeholder: {:?}", destination);
        }
        LinkMode::None => return Err(SysError::InvalidLinkMode(mode.to_string())),
    }

    Ok(())
}

#[cfg(unix)]
fn make_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn make_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, destination)
}
