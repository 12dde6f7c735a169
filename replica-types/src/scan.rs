// SPDX-License-Identifier: GPL-3.0-only

/// Descriptor file name, matched case-insensitively during discovery
pub const DESCRIPTOR_FILE_NAME: &str = "volume.toml";

/// Subdirectory of every scan root that holds volumes
pub const VOLUMES_DIR_NAME: &str = "volumes";

/// Entire content of a placeholder file
pub const PLACEHOLDER_MARKER: &str = "cheatfile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Worker threads for discovery; `None` uses available parallelism
    pub threads: Option<usize>,
    pub descriptor_name: String,
    pub volumes_dir_name: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: None,
            descriptor_name: DESCRIPTOR_FILE_NAME.to_string(),
            volumes_dir_name: VOLUMES_DIR_NAME.to_string(),
        }
    }
}

impl ScanConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn thread_count(&self) -> usize {
        self.threads
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(4, usize::from))
            .max(1)
    }

    pub fn is_descriptor_name(&self, file_name: &str) -> bool {
        file_name.eq_ignore_ascii_case(&self.descriptor_name)
    }
}

#[cfg(test)]
mod tests {
    use super::ScanConfig;

    #[test]
    fn descriptor_name_matches_case_insensitively() {
        let config = ScanConfig::default();
        assert!(config.is_descriptor_name("volume.toml"));
        assert!(config.is_descriptor_name("VOLUME.TOML"));
        assert!(!config.is_descriptor_name("volume.toml.bak"));
    }

    #[test]
    fn thread_count_is_never_zero() {
        assert_eq!(ScanConfig::default().with_threads(0).thread_count(), 1);
        assert!(ScanConfig::default().thread_count() >= 1);
    }
}
