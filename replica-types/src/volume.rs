// SPDX-License-Identifier: GPL-3.0-only

//! Data models for the per-volume descriptor file
//!
//! A descriptor is stored as TOML with three tables:
//!
//! ```toml
//! [library]
//! uuid = "0d6f3c7e-..."
//!
//! [volume]
//! mode = "storage"
//! note = "shelf drive"
//!
//! [advanced]
//! rclone_arguments = "--checksum"
//! link_create = "symlink"
//! ```
//!
//! Fields are kept as raw strings so that a descriptor with a bad value can
//! still be parsed and then rejected by validation with a precise reason.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a volume plays inside its library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VolumeMode {
    /// Source of new content, propagated outward to storages
    Buffer,
    /// Durable replica, eligible for linking and bidirectional sync
    Storage,
}

impl VolumeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            VolumeMode::Buffer => "buffer",
            VolumeMode::Storage => "storage",
        }
    }
}

impl std::fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VolumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buffer" => Ok(VolumeMode::Buffer),
            "storage" => Ok(VolumeMode::Storage),
            "" => Err("volume mode is empty".to_string()),
            _ => Err(format!(
                "invalid volume mode '{}'; must be 'storage' or 'buffer'",
                s
            )),
        }
    }
}

/// How peers link their files into this volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LinkMode {
    /// No incoming links
    #[default]
    None,
    /// Symbolic link to the absolute source path
    Symlink,
    /// Small regular file holding the placeholder marker
    Placeholder,
}

impl LinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::None => "none",
            LinkMode::Symlink => "symlink",
            LinkMode::Placeholder => "placeholder",
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, LinkMode::None)
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(LinkMode::None),
            "symlink" => Ok(LinkMode::Symlink),
            // Spelling used by older descriptors.
            "placeholder" | "cheatfile" => Ok(LinkMode::Placeholder),
            _ => Err(format!(
                "invalid link mode '{}'; must be 'none', 'symlink', or 'placeholder'",
                s
            )),
        }
    }
}

/// `[library]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Identifier shared by every volume of one library
    #[serde(default)]
    pub uuid: String,
}

/// `[volume]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSection {
    /// `storage` or `buffer`
    #[serde(default)]
    pub mode: String,

    /// Free text shown in listings
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

/// `[advanced]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSection {
    /// Passed verbatim to rclone when this volume is a copy destination
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rclone_arguments: String,

    /// `none`, `symlink` or `placeholder`; empty means `none`
    #[serde(default, alias = "link_creat", skip_serializing_if = "String::is_empty")]
    pub link_create: String,
}

/// Parsed contents of one `volume.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    #[serde(default)]
    pub library: LibrarySection,
    #[serde(default)]
    pub volume: VolumeSection,
    #[serde(default)]
    pub advanced: AdvancedSection,
}

impl VolumeDescriptor {
    pub fn new(library_id: impl Into<String>, mode: VolumeMode) -> Self {
        Self {
            library: LibrarySection {
                uuid: library_id.into(),
            },
            volume: VolumeSection {
                mode: mode.as_str().to_string(),
                note: String::new(),
            },
            advanced: AdvancedSection::default(),
        }
    }

    /// Starter descriptor written by `template new`.
    ///
    /// A fresh v4 UUID is generated when no library id is given.
    pub fn template(library_id: Option<&str>) -> Self {
        let library_id = match library_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut descriptor = Self::new(library_id, VolumeMode::Storage);
        descriptor.volume.note = "ANY".to_string();
        descriptor.advanced.link_create = LinkMode::None.as_str().to_string();
        descriptor
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.volume.note = note.into();
        self
    }

    pub fn with_rclone_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.advanced.rclone_arguments = arguments.into();
        self
    }

    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.advanced.link_create = mode.as_str().to_string();
        self
    }

    pub fn library_id(&self) -> &str {
        &self.library.uuid
    }

    /// Declared role, `None` when the raw value is not a known mode
    pub fn mode(&self) -> Option<VolumeMode> {
        self.volume.mode.parse().ok()
    }

    /// Declared link mode; an empty value is `LinkMode::None`
    pub fn link_mode(&self) -> Result<LinkMode, String> {
        if self.advanced.link_create.is_empty() {
            return Ok(LinkMode::None);
        }
        self.advanced.link_create.parse()
    }

    pub fn note(&self) -> &str {
        &self.volume.note
    }

    pub fn rclone_arguments(&self) -> &str {
        &self.advanced.rclone_arguments
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_tables() {
        let raw = r#"
            [library]
            uuid = "lib-1"

            [volume]
            mode = "storage"
            note = "shelf"

            [advanced]
            rclone_arguments = "--checksum"
            link_create = "symlink"
        "#;

        let descriptor = VolumeDescriptor::from_toml_str(raw).expect("parse descriptor");
        assert_eq!(descriptor.library_id(), "lib-1");
        assert_eq!(descriptor.mode(), Some(VolumeMode::Storage));
        assert_eq!(descriptor.note(), "shelf");
        assert_eq!(descriptor.rclone_arguments(), "--checksum");
        assert_eq!(descriptor.link_mode(), Ok(LinkMode::Symlink));
    }

    #[test]
    fn missing_tables_default_to_empty_fields() {
        let descriptor = VolumeDescriptor::from_toml_str("[library]\nuuid = \"x\"\n")
            .expect("parse descriptor");
        assert_eq!(descriptor.volume.mode, "");
        assert_eq!(descriptor.mode(), None);
        assert_eq!(descriptor.link_mode(), Ok(LinkMode::None));
    }

    #[test]
    fn accepts_legacy_link_key_and_value() {
        let raw = "[advanced]\nlink_creat = \"cheatfile\"\n";
        let descriptor = VolumeDescriptor::from_toml_str(raw).expect("parse descriptor");
        assert_eq!(descriptor.link_mode(), Ok(LinkMode::Placeholder));
    }

    #[test]
    fn mode_parsing_is_exact() {
        assert_eq!("buffer".parse::<VolumeMode>(), Ok(VolumeMode::Buffer));
        assert!("Storage".parse::<VolumeMode>().is_err());
        assert!("archive".parse::<VolumeMode>().is_err());
        assert!("".parse::<VolumeMode>().is_err());
    }

    #[test]
    fn template_generates_library_id_when_missing() {
        let template = VolumeDescriptor::template(None);
        assert!(Uuid::parse_str(template.library_id()).is_ok());
        assert_eq!(template.mode(), Some(VolumeMode::Storage));
        assert_eq!(template.note(), "ANY");
        assert_eq!(template.advanced.link_create, "none");

        let pinned = VolumeDescriptor::template(Some("lib-7"));
        assert_eq!(pinned.library_id(), "lib-7");
    }

    #[test]
    fn template_survives_toml_roundtrip() {
        let template = VolumeDescriptor::template(Some("lib-7")).with_rclone_arguments("--fast-list");
        let raw = template.to_toml_string().expect("serialize template");
        let parsed = VolumeDescriptor::from_toml_str(&raw).expect("parse template");
        assert_eq!(parsed, template);
    }
}
