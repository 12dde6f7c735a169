// SPDX-License-Identifier: GPL-3.0-only

//! Writing generated command plans to reviewable script files

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[cfg(windows)]
const SCRIPT_HEADER: &str = "@echo off\n\n";
#[cfg(not(windows))]
const SCRIPT_HEADER: &str = "#!/bin/bash\nset -e\n\n";

#[cfg(windows)]
const SCRIPT_EXTENSION: &str = "bat";
#[cfg(not(windows))]
const SCRIPT_EXTENSION: &str = "sh";

const FILE_PREFIX: &str = "replica";

/// Header comment placed above delete commands
pub const DROP_NOTICE: &[&str] = &[
    "Deletes the listed files from every volume of the library.",
    "Every command carries --dry-run; remove it after reviewing to delete for real.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Append,
    Storage,
    Drop,
}

impl ScriptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Append => "append",
            ScriptKind::Storage => "storage",
            ScriptKind::Drop => "drop",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn short_id(library_id: &str) -> String {
    library_id.chars().take(8).collect()
}

/// Where a script of `kind` is written.
///
/// Without `output` the name is `replica_<kind>[_<id8>].<ext>` in the current
/// directory. An explicit `output` is used as is, unless several scripts are
/// written in one run; then it becomes `<stem>_<kind>[_<id8>].<ext>` next to it.
pub fn script_path(
    kind: ScriptKind,
    library_id: Option<&str>,
    output: Option<&Path>,
    several: bool,
) -> PathBuf {
    let suffix = match library_id {
        Some(id) => format!("{}_{}", kind, short_id(id)),
        None => kind.to_string(),
    };

    match output {
        Some(path) if !several => path.to_path_buf(),
        Some(path) => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| FILE_PREFIX.to_string());
            let extension = path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_else(|| SCRIPT_EXTENSION.to_string());
            path.with_file_name(format!("{stem}_{suffix}.{extension}"))
        }
        None => PathBuf::from(format!("{FILE_PREFIX}_{suffix}.{SCRIPT_EXTENSION}")),
    }
}

fn comment_prefix() -> &'static str {
    if cfg!(windows) { "REM " } else { "# " }
}

/// Script text: header, optional comment lines, then one command per line
pub fn render_script(notice: &[&str], commands: &[String]) -> String {
    let mut script = String::from(SCRIPT_HEADER);
    if !notice.is_empty() {
        for line in notice {
            script.push_str(comment_prefix());
            script.push_str(line);
            script.push('\n');
        }
        script.push('\n');
    }
    for command in commands {
        script.push_str(command);
        script.push('\n');
    }
    script
}

pub fn write_script(path: &Path, notice: &[&str], commands: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, render_script(notice, commands))
        .with_context(|| format!("failed to write script {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("failed to mark {} executable", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_carry_kind_and_short_id() {
        assert_eq!(
            script_path(ScriptKind::Append, None, None, true),
            PathBuf::from(format!("replica_append.{SCRIPT_EXTENSION}"))
        );
        assert_eq!(
            script_path(
                ScriptKind::Storage,
                Some("6a2f41a3-c54c-4a4e-9b7f-3d0a8f1e2b44"),
                None,
                false
            ),
            PathBuf::from(format!("replica_storage_6a2f41a3.{SCRIPT_EXTENSION}"))
        );
        assert_eq!(
            script_path(ScriptKind::Drop, Some("abc"), None, false),
            PathBuf::from(format!("replica_drop_abc.{SCRIPT_EXTENSION}"))
        );
    }

    #[test]
    fn explicit_output_is_kept_for_a_single_script() {
        let output = Path::new("out/plan.sh");
        assert_eq!(
            script_path(ScriptKind::Append, Some("abcdef0123"), Some(output), false),
            PathBuf::from("out/plan.sh")
        );
        assert_eq!(
            script_path(ScriptKind::Append, Some("abcdef0123"), Some(output), true),
            PathBuf::from("out/plan_append_abcdef01.sh")
        );
        assert_eq!(
            script_path(ScriptKind::Storage, None, Some(Path::new("plan")), true),
            PathBuf::from(format!("plan_storage.{SCRIPT_EXTENSION}"))
        );
    }

    #[test]
    fn written_script_has_header_and_one_command_per_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested/replica_append.sh");
        let commands = vec![
            "rclone copy \"/b\" \"/s1\" --checksum".to_string(),
            "rclone copy \"/b\" \"/s2\"".to_string(),
        ];

        write_script(&path, &[], &commands).expect("write script");

        let content = fs::read_to_string(&path).expect("read script");
        assert!(content.starts_with(SCRIPT_HEADER));
        let body: Vec<&str> = content[SCRIPT_HEADER.len()..].lines().collect();
        assert_eq!(body, commands.iter().map(String::as_str).collect::<Vec<_>>());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn notice_lines_are_comments() {
        let script = render_script(DROP_NOTICE, &["rclone delete \"/v/a\" --dry-run".to_string()]);
        assert!(script.lines().any(|line| line.starts_with(comment_prefix().trim_end())
            && line.contains("--dry-run")));
        assert!(script.ends_with("rclone delete \"/v/a\" --dry-run\n"));
    }
}
