// SPDX-License-Identifier: GPL-3.0-only

//! Mount point enumeration
//!
//! Network and FUSE mounts are kept: cloud drives mounted through rclone are
//! ordinary scan roots. Only kernel pseudo filesystems are dropped.

use std::collections::BTreeSet;
use std::path::PathBuf;

use replica_contracts::{MountPointSource, ReplicaError};
use tracing::debug;

use crate::error::{Result, SysError};

const PSEUDO_FS_TYPES: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nsfs",
    "overlay",
    "proc",
    "pstore",
    "ramfs",
    "rpc_pipefs",
    "securityfs",
    "selinuxfs",
    "squashfs",
    "sysfs",
    "tmpfs",
    "tracefs",
];

/// Mount points reported by the running operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMounts;

impl MountPointSource for SystemMounts {
    fn mount_points(&self) -> std::result::Result<Vec<PathBuf>, ReplicaError> {
        Ok(system_mount_points()?)
    }
}

/// A fixed list of roots, for callers that already know where volumes live
#[derive(Debug, Clone, Default)]
pub struct FixedMounts(pub Vec<PathBuf>);

impl MountPointSource for FixedMounts {
    fn mount_points(&self) -> std::result::Result<Vec<PathBuf>, ReplicaError> {
        Ok(self.0.clone())
    }
}

#[cfg(target_os = "linux")]
pub fn system_mount_points() -> Result<Vec<PathBuf>> {
    let mount_info = std::fs::read_to_string("/proc/self/mountinfo")
        .map_err(|error| SysError::Discovery(format!("read /proc/self/mountinfo: {error}")))?;
    let mut mounts = parse_mountinfo(&mount_info)?;
    ensure_root(&mut mounts);
    debug!("Found {} mount points", mounts.len());
    Ok(mounts)
}

#[cfg(all(unix, not(target_os = "linux")))]
pub fn system_mount_points() -> Result<Vec<PathBuf>> {
    let output = std::process::Command::new("df")
        .arg("-P")
        .output()
        .map_err(|error| SysError::Discovery(format!("failed to run 'df -P': {error}")))?;

    if !output.status.success() {
        return Err(SysError::Discovery(format!(
            "'df -P' exited with {}",
            output.status
        )));
    }

    let mut mounts = parse_df_output(&String::from_utf8_lossy(&output.stdout));
    ensure_root(&mut mounts);
    debug!("Found {} mount points", mounts.len());
    Ok(mounts)
}

#[cfg(windows)]
pub fn system_mount_points() -> Result<Vec<PathBuf>> {
    let mounts: Vec<PathBuf> = (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|drive| drive.exists())
        .collect();
    debug!("Found {} drive roots", mounts.len());
    Ok(mounts)
}

#[cfg(unix)]
fn ensure_root(mounts: &mut Vec<PathBuf>) {
    let root = PathBuf::from("/");
    if !mounts.contains(&root) {
        mounts.insert(0, root);
    }
}

/// Parses `/proc/self/mountinfo` content into sorted, unique mount points
pub fn parse_mountinfo(input: &str) -> Result<Vec<PathBuf>> {
    let mut roots = BTreeSet::new();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let (left, right) = line
            .split_once(" - ")
            .ok_or_else(|| SysError::Discovery(format!("invalid mountinfo line: {line}")))?;

        let mount_point = left
            .split_whitespace()
            .nth(4)
            .ok_or_else(|| SysError::Discovery(format!("invalid mountinfo line: {line}")))?;

        let fs_type = right
            .split_whitespace()
            .next()
            .ok_or_else(|| SysError::Discovery(format!("invalid mountinfo line: {line}")))?;

        if is_pseudo_fs_type(fs_type) {
            continue;
        }

        roots.insert(PathBuf::from(unescape_mount_field(mount_point)));
    }

    Ok(roots.into_iter().collect())
}

/// Parses POSIX `df -P` output, taking the last column of every data row
pub fn parse_df_output(input: &str) -> Vec<PathBuf> {
    let mut roots = BTreeSet::new();

    for line in input.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            continue;
        }
        let filesystem = fields[0];
        if filesystem == "devfs" || filesystem == "tmpfs" || filesystem == "none" {
            continue;
        }
        // Mount points containing spaces span the trailing fields.
        roots.insert(PathBuf::from(fields[5..].join(" ")));
    }

    roots.into_iter().collect()
}

fn is_pseudo_fs_type(fs_type: &str) -> bool {
    PSEUDO_FS_TYPES.contains(&fs_type)
}

fn unescape_mount_field(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1].is_ascii_digit()
            && bytes[index + 2].is_ascii_digit()
            && bytes[index + 3].is_ascii_digit()
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num);
                index += 4;
                continue;
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}
