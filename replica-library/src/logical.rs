// SPDX-License-Identifier: GPL-3.0-only

//! Logical tree: volumes grouped by library and split by role

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use replica_contracts::ReplicaError;
use replica_sys::PhysicalTree;
use replica_types::{VolumeDescriptor, VolumeMode};
use tracing::{debug, info, warn};

/// A volume as seen from its library
#[derive(Debug, Clone)]
pub struct Volume {
    pub library_id: String,
    pub mode: VolumeMode,
    pub base_path: PathBuf,
    pub descriptor: Arc<VolumeDescriptor>,
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    pub id: String,
    pub buffers: Vec<Volume>,
    pub storages: Vec<Volume>,
}

impl Library {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buffers: Vec::new(),
            storages: Vec::new(),
        }
    }

    pub fn volume_count(&self) -> usize {
        self.buffers.len() + self.storages.len()
    }

    /// Buffers first, then storages
    pub fn volumes(&self) -> impl Iterator<Item = &Volume> {
        self.buffers.iter().chain(self.storages.iter())
    }
}

/// Library identifier → library, iterated in identifier order
#[derive(Debug, Clone, Default)]
pub struct LogicalTree {
    libraries: BTreeMap<String, Library>,
}

impl LogicalTree {
    pub fn get(&self, library_id: &str) -> Option<&Library> {
        self.libraries.get(library_id)
    }

    /// Like [`get`](Self::get), with a `NotFound` error for unknown ids
    pub fn require(&self, library_id: &str) -> Result<&Library, ReplicaError> {
        self.get(library_id).ok_or_else(|| {
            ReplicaError::not_found(format!("library with id '{}' not found", library_id))
        })
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn volume_count(&self) -> usize {
        self.libraries.values().map(Library::volume_count).sum()
    }
}

/// Groups every physical volume under its library, by declared mode.
///
/// Volumes whose mode is not recognised are dropped with a warning.
/// Within a library, volumes keep the physical tree's path order.
pub fn build_logical_tree(physical: &PhysicalTree) -> LogicalTree {
    let mut tree = LogicalTree::default();

    if physical.is_empty() {
        info!("No physical volumes found to build logical tree");
        return tree;
    }

    for (base_path, descriptor) in physical.sorted() {
        let library_id = descriptor.library_id();

        let Some(mode) = descriptor.mode() else {
            warn!(
                "Volume {:?} has unknown mode '{}', skipping",
                base_path, descriptor.volume.mode
            );
            continue;
        };

        let library = tree
            .libraries
            .entry(library_id.to_string())
            .or_insert_with(|| Library::new(library_id));

        let volume = Volume {
            library_id: library_id.to_string(),
            mode,
            base_path: base_path.clone(),
            descriptor: Arc::clone(descriptor),
        };

        match mode {
            VolumeMode::Buffer => library.buffers.push(volume),
            VolumeMode::Storage => library.storages.push(volume),
        }
        debug!("Added {} volume {:?} to library '{}'", mode, base_path, library_id);
    }

    info!(
        "Logical tree built: {} libraries, {} volumes",
        tree.len(),
        tree.volume_count()
    );
    tree
}
