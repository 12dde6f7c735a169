// SPDX-License-Identifier: GPL-3.0-only

//! Physical tree: every valid volume directory found under the scan roots
//!
//! Each scan root is searched by its own rayon task. Tasks walk
//! `<root>/volumes` independently and only serialize on the final map insert.
//! The build returns after every task has finished, so the tree is never read
//! while it is still being filled.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use replica_contracts::{MountPointSource, ReplicaError, UserConfigSource};
use replica_types::{ScanConfig, VolumeDescriptor};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::descriptor::load_descriptor;
use crate::error::{Result, SysError};

/// Volume base directory → descriptor loaded from it
#[derive(Debug, Clone, Default)]
pub struct PhysicalTree {
    volumes: HashMap<PathBuf, Arc<VolumeDescriptor>>,
}

impl PhysicalTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the descriptor for `base_path`
    pub fn insert(&mut self, base_path: PathBuf, descriptor: VolumeDescriptor) {
        self.volumes.insert(base_path, Arc::new(descriptor));
    }

    pub fn get(&self, base_path: &Path) -> Option<&Arc<VolumeDescriptor>> {
        self.volumes.get(base_path)
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Arc<VolumeDescriptor>)> {
        self.volumes.iter()
    }

    /// Entries sorted by base path
    pub fn sorted(&self) -> Vec<(&PathBuf, &Arc<VolumeDescriptor>)> {
        let mut entries: Vec<_> = self.volumes.iter().collect();
        entries.sort_by(|left, right| left.0.cmp(right.0));
        entries
    }
}

impl FromIterator<(PathBuf, VolumeDescriptor)> for PhysicalTree {
    fn from_iter<I: IntoIterator<Item = (PathBuf, VolumeDescriptor)>>(iter: I) -> Self {
        let mut tree = PhysicalTree::new();
        for (base_path, descriptor) in iter {
            tree.insert(base_path, descriptor);
        }
        tree
    }
}

/// Deduplicated union of OS mount points and user-configured extra roots.
///
/// A failing mount source aborts; a failing user config only loses the extras.
pub fn scan_roots(
    mounts: &dyn MountPointSource,
    user_config: &dyn UserConfigSource,
) -> std::result::Result<Vec<PathBuf>, ReplicaError> {
    let mut roots: BTreeSet<PathBuf> = mounts.mount_points()?.into_iter().collect();

    match user_config.additional_mount_points() {
        Ok(extra) => roots.extend(extra),
        Err(error) => warn!(
            "Failed to load user config for additional mount points: {}",
            error
        ),
    }

    Ok(roots.into_iter().collect())
}

/// Builds the physical tree, degrading to an empty tree when discovery fails
pub fn build_physical_tree(
    mounts: &dyn MountPointSource,
    user_config: &dyn UserConfigSource,
    config: &ScanConfig,
) -> PhysicalTree {
    match try_build_physical_tree(mounts, user_config, config) {
        Ok(tree) => tree,
        Err(error) => {
            error!("Failed to get mount points: {}", error);
            PhysicalTree::new()
        }
    }
}

pub fn try_build_physical_tree(
    mounts: &dyn MountPointSource,
    user_config: &dyn UserConfigSource,
    config: &ScanConfig,
) -> std::result::Result<PhysicalTree, ReplicaError> {
    let roots = scan_roots(mounts, user_config)?;
    Ok(scan_volume_roots(&roots, config)?)
}

/// Scans each root's volumes directory concurrently and joins the results
pub fn scan_volume_roots(roots: &[PathBuf], config: &ScanConfig) -> Result<PhysicalTree> {
    if roots.is_empty() {
        return Ok(PhysicalTree::new());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.thread_count())
        .build()
        .map_err(|error| SysError::ThreadPoolBuild(error.to_string()))?;

    let shared = Mutex::new(HashMap::new());
    let skipped = AtomicUsize::new(0);

    pool.install(|| {
        roots.par_iter().for_each(|root| {
            match load_volumes_from_root(root, config, &shared, &skipped) {
                Ok(0) => {}
                Ok(loaded) => debug!("Loaded {} volumes under {:?}", loaded, root),
                Err(error) => warn!("Failed to process volumes under {:?}: {}", root, error),
            }
        })
    });

    let volumes = shared
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let tree = PhysicalTree { volumes };

    info!(
        "Physical tree built: {} volumes from {} roots ({} descriptors skipped)",
        tree.len(),
        roots.len(),
        skipped.load(Ordering::Relaxed)
    );
    Ok(tree)
}

/// Walks `<root>/volumes` and inserts every valid descriptor found.
///
/// A missing volumes directory contributes nothing. Returns the number of
/// volumes inserted.
fn load_volumes_from_root(
    root: &Path,
    config: &ScanConfig,
    shared: &Mutex<HashMap<PathBuf, Arc<VolumeDescriptor>>>,
    skipped: &AtomicUsize,
) -> Result<usize> {
    let volumes_dir = root.join(&config.volumes_dir_name);

    match fs::metadata(&volumes_dir) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            debug!("{:?} is not a directory, skipping", volumes_dir);
            return Ok(0);
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(error) => {
            return Err(SysError::Walk {
                path: volumes_dir,
                reason: error.to_string(),
            });
        }
    }

    let mut loaded = 0;

    for entry in WalkDir::new(&volumes_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("Error walking {:?}: {}", volumes_dir, error);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let is_descriptor = entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.is_descriptor_name(name));
        if !is_descriptor {
            continue;
        }

        let descriptor_path = entry.path();
        let descriptor = match load_descriptor(descriptor_path) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                warn!("Skipping {:?}: {}", descriptor_path, error);
                skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };

        let Some(base_path) = descriptor_path.parent() else {
            continue;
        };

        {
            let mut volumes = shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            volumes.insert(base_path.to_path_buf(), Arc::new(descriptor));
        }

        info!("Loaded volume from {:?}", base_path);
        loaded += 1;
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mounts::FixedMounts;
    use replica_types::{UserConfig, VolumeMode};

    fn write_volume(root: &Path, relative: &str, body: &str) -> PathBuf {
        let base = root.join("volumes").join(relative);
        fs::create_dir_all(&base).expect("create volume dir");
        fs::write(base.join("volume.toml"), body).expect("write descriptor");
        base
    }

    fn storage_body(library: &str) -> String {
        format!("[library]\nuuid = \"{library}\"\n[volume]\nmode = \"storage\"\n")
    }

    struct FailingMounts;

    impl MountPointSource for FailingMounts {
        fn mount_points(&self) -> std::result::Result<Vec<PathBuf>, ReplicaError> {
            Err(ReplicaError::discovery("no mount table"))
        }
    }

    #[test]
    fn loads_valid_volumes_across_roots_and_skips_invalid_ones() {
        let first = tempfile::tempdir().expect("temp dir");
        let second = tempfile::tempdir().expect("temp dir");
        let empty = tempfile::tempdir().expect("temp dir");

        let a = write_volume(first.path(), "a", &storage_body("lib"));
        let b = write_volume(second.path(), "nested/b", &storage_body("lib"));
        write_volume(second.path(), "bad", "[library]\nuuid = \"lib\"\n[volume]\nmode = \"archive\"\n");
        write_volume(second.path(), "broken", "not toml [");

        let roots = vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
            empty.path().to_path_buf(),
        ];
        let tree = scan_volume_roots(&roots, &ScanConfig::default().with_threads(2))
            .expect("scan roots");

        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.get(&a).and_then(|descriptor| descriptor.mode()),
            Some(VolumeMode::Storage)
        );
        assert!(tree.get(&b).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_does_not_stop_the_scan() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().expect("temp dir");
        let good = write_volume(root.path(), "good", &storage_body("lib"));
        write_volume(root.path(), "locked/inner", &storage_body("lib"));
        let locked = root.path().join("volumes").join("locked");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("lock dir");
        // Privileged users read through the mode bits.
        let readable = fs::read_dir(&locked).is_ok();
        let result = scan_volume_roots(&[root.path().to_path_buf()], &ScanConfig::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock dir");

        let tree = result.expect("scan roots");
        assert!(tree.get(&good).is_some());
        assert_eq!(tree.len(), if readable { 2 } else { 1 });
    }

    #[test]
    fn descriptor_name_is_case_insensitive() {
        let root = tempfile::tempdir().expect("temp dir");
        let base = root.path().join("volumes").join("upper");
        fs::create_dir_all(&base).expect("create volume dir");
        fs::write(base.join("Volume.TOML"), storage_body("lib")).expect("write descriptor");

        let tree = scan_volume_roots(&[root.path().to_path_buf()], &ScanConfig::default())
            .expect("scan roots");
        assert!(tree.get(&base).is_some());
    }

    #[test]
    fn duplicate_roots_collapse_to_one_entry_per_volume() {
        let root = tempfile::tempdir().expect("temp dir");
        write_volume(root.path(), "a", &storage_body("lib"));

        let user_config = UserConfig {
            collections: Vec::new(),
            additional_mountpoints: vec![root.path().to_path_buf()],
        };
        let mounts = FixedMounts(vec![root.path().to_path_buf()]);

        let roots = scan_roots(&mounts, &user_config).expect("roots");
        assert_eq!(roots, vec![root.path().to_path_buf()]);

        let tree = build_physical_tree(&mounts, &user_config, &ScanConfig::default());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn discovery_failure_yields_empty_tree() {
        let tree = build_physical_tree(
            &FailingMounts,
            &UserConfig::default(),
            &ScanConfig::default(),
        );
        assert!(tree.is_empty());

        let error = try_build_physical_tree(
            &FailingMounts,
            &UserConfig::default(),
            &ScanConfig::default(),
        )
        .unwrap_err();
        assert_eq!(error.kind, replica_contracts::ReplicaErrorKind::DiscoveryFailure);
    }

    #[test]
    fn sorted_entries_are_ordered_by_path() {
        let tree: PhysicalTree = vec![
            (PathBuf::from("/b"), VolumeDescriptor::new("lib", VolumeMode::Storage)),
            (PathBuf::from("/a"), VolumeDescriptor::new("lib", VolumeMode::Buffer)),
        ]
        .into_iter()
        .collect();

        let paths: Vec<_> = tree.sorted().into_iter().map(|(path, _)| path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
