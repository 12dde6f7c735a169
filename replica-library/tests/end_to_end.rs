// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use replica_library::{
    build_append, build_drop, build_logical_tree, build_sync, link_all_libraries, link_library,
    resolve_library_id,
};
use replica_sys::{FixedMounts, build_physical_tree, write_descriptor};
use replica_types::{
    Collection, DESCRIPTOR_FILE_NAME, LinkMode, ScanConfig, UserConfig, VOLUMES_DIR_NAME,
    VolumeDescriptor, VolumeMode,
};

const LIBRARY: &str = "6a2f41a3-c54c-4a4e-9b7f-3d0a8f1e2b44";

fn volume(mount: &Path, name: &str, descriptor: &VolumeDescriptor) -> PathBuf {
    let base = mount.join(VOLUMES_DIR_NAME).join(name);
    write_descriptor(&base.join(DESCRIPTOR_FILE_NAME), descriptor).expect("write descriptor");
    base
}

#[test]
fn scanned_volumes_plan_and_link() {
    let disk_a = tempfile::tempdir().expect("disk a");
    let disk_b = tempfile::tempdir().expect("disk b");

    let buffer = volume(
        disk_a.path(),
        "inbox",
        &VolumeDescriptor::new(LIBRARY, VolumeMode::Buffer),
    );
    let first = volume(
        disk_a.path(),
        "archive",
        &VolumeDescriptor::new(LIBRARY, VolumeMode::Storage)
            .with_rclone_arguments("--checksum")
            .with_link_mode(LinkMode::Symlink),
    );
    let second = volume(
        disk_b.path(),
        "mirror",
        &VolumeDescriptor::new(LIBRARY, VolumeMode::Storage)
            .with_link_mode(LinkMode::Placeholder),
    );

    // Invalid descriptor is excluded from the scan, not fatal to it.
    let broken = disk_b.path().join(VOLUMES_DIR_NAME).join("broken");
    fs::create_dir_all(&broken).expect("broken dir");
    fs::write(
        broken.join(DESCRIPTOR_FILE_NAME),
        "[library]\nuuid = \"x\"\n[volume]\nmode = \"archive\"\n",
    )
    .expect("write broken descriptor");

    fs::write(first.join("song.flac"), b"first").expect("write first");
    fs::write(second.join("photo.jpg"), b"second").expect("write second");

    let mounts = FixedMounts(vec![disk_a.path().to_path_buf()]);
    let mut user_config = UserConfig {
        additional_mountpoints: vec![disk_b.path().to_path_buf()],
        ..UserConfig::default()
    };
    user_config
        .add_collection(Collection::new("media", LIBRARY))
        .expect("register shortname");

    let physical = build_physical_tree(&mounts, &user_config, &ScanConfig::default());
    assert_eq!(physical.len(), 3);

    let logical = build_logical_tree(&physical);
    let id = resolve_library_id("media", &user_config);
    let library = logical.require(id.id()).expect("library present");
    assert_eq!(library.buffers.len(), 1);
    assert_eq!(library.storages.len(), 2);

    let append = build_append(&logical, id.id()).expect("append");
    assert_eq!(append.len(), 2);
    assert!(append.contains(&format!(
        "rclone copy \"{}\" \"{}\" --checksum",
        buffer.display(),
        first.display()
    )));

    assert_eq!(build_sync(&logical, id.id()).expect("sync").len(), 2);
    assert_eq!(
        build_drop(&logical, id.id(), &["old/file.txt"])
            .expect("drop")
            .len(),
        3
    );

    let outcome = link_library(&logical, id.id(), false).expect("link");
    assert_eq!(outcome.failed_pairs(), 0);
    assert_eq!(outcome.linked(), 2);
    assert!(
        fs::symlink_metadata(first.join("photo.jpg"))
            .expect("symlink in first")
            .file_type()
            .is_symlink()
    );
    assert!(second.join("song.flac").is_file());

    // Second run leaves the same state and creates nothing new.
    let again = link_all_libraries(&logical, false).expect("relink");
    assert!(again.is_clean());
    let outcome = &again.outcomes[0];
    assert_eq!(outcome.pairs.len(), 2);
    assert!(
        outcome
            .pairs
            .iter()
            .filter_map(|pair| pair.report())
            .all(|report| report.created.is_empty())
    );
}
