// SPDX-License-Identifier: GPL-3.0-only

//! RClone command rendering
//!
//! Commands are rendered as text for a script the user reviews and runs.
//! Nothing in this module executes rclone.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use which::which;

use crate::error::{Result, SysError};

/// Executable name written into generated scripts
pub const RCLONE_TOOL: &str = "rclone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcloneVerb {
    Copy,
    Delete,
}

impl RcloneVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            RcloneVerb::Copy => "copy",
            RcloneVerb::Delete => "delete",
        }
    }
}

/// One line of a generated script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcloneCommand {
    pub verb: RcloneVerb,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    /// Extra flags, appended after trimming when non-empty
    pub arguments: String,
}

impl RcloneCommand {
    pub fn copy(source: &Path, destination: &Path, arguments: &str) -> Self {
        Self {
            verb: RcloneVerb::Copy,
            source: source.to_path_buf(),
            destination: Some(destination.to_path_buf()),
            arguments: arguments.to_string(),
        }
    }

    pub fn delete(target: &Path, arguments: &str) -> Self {
        Self {
            verb: RcloneVerb::Delete,
            source: target.to_path_buf(),
            destination: None,
            arguments: arguments.to_string(),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RcloneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Paths are quoted so that embedded spaces survive the shell.
        write!(
            f,
            "{} {} \"{}\"",
            RCLONE_TOOL,
            self.verb.as_str(),
            self.source.display()
        )?;

        if let Some(destination) = &self.destination {
            write!(f, " \"{}\"", destination.display())?;
        }

        let arguments = self.arguments.trim();
        if !arguments.is_empty() {
            write!(f, " {}", arguments)?;
        }

        Ok(())
    }
}

/// RClone binary lookup
pub struct RCloneCli {
    binary_path: PathBuf,
}

impl RCloneCli {
    /// Returns an error if rclone is not installed
    pub fn new() -> Result<Self> {
        let binary_path = Self::find_rclone_binary()?;
        debug!("Found rclone binary at {:?}", binary_path);
        Ok(Self { binary_path })
    }

    pub fn find_rclone_binary() -> Result<PathBuf> {
        which(RCLONE_TOOL).map_err(|_| SysError::RcloneNotFound)
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_quotes_paths_and_appends_trimmed_arguments() {
        let command = RcloneCommand::copy(
            Path::new("/mnt/buffer one"),
            Path::new("/mnt/s1"),
            "  --checksum --transfers 8 ",
        );
        assert_eq!(
            command.render(),
            "rclone copy \"/mnt/buffer one\" \"/mnt/s1\" --checksum --transfers 8"
        );
    }

    #[test]
    fn blank_arguments_leave_no_trailing_space() {
        let command = RcloneCommand::copy(Path::new("/b"), Path::new("/s2"), "   ");
        assert_eq!(command.render(), "rclone copy \"/b\" \"/s2\"");
    }

    #[test]
    fn delete_has_a_single_target() {
        let command = RcloneCommand::delete(Path::new("/s1/a b.jpg"), "--dry-run");
        assert_eq!(command.render(), "rclone delete \"/s1/a b.jpg\" --dry-run");
    }
}
