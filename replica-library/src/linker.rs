// SPDX-License-Identifier: GPL-3.0-only

//! Linking between the storage volumes of a library
//!
//! Every ordered pair of distinct storages is visited. The destination's own
//! link mode decides what happens, so a storage set to `none` receives
//! nothing from any peer.

use std::path::PathBuf;

use replica_contracts::{ReplicaError, ReplicaErrorKind};
use replica_sys::{LinkReport, SysError, link_volume, preview_volume_links};
use replica_types::LinkMode;
use tracing::{debug, error, info, warn};

use crate::logical::{Library, LogicalTree, Volume};

#[derive(Debug)]
pub enum PairStatus {
    /// The destination does not accept incoming links
    Skipped,
    Linked(LinkReport),
    /// The pair could not be processed at all
    Failed(SysError),
}

#[derive(Debug)]
pub struct PairOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: Option<LinkMode>,
    pub status: PairStatus,
}

impl PairOutcome {
    pub fn report(&self) -> Option<&LinkReport> {
        match &self.status {
            PairStatus::Linked(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        match &self.status {
            PairStatus::Failed(_) => true,
            PairStatus::Linked(report) => report.has_failures(),
            PairStatus::Skipped => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct LibraryLinkOutcome {
    pub library_id: String,
    pub dry_run: bool,
    pub pairs: Vec<PairOutcome>,
}

impl LibraryLinkOutcome {
    pub fn linked(&self) -> usize {
        self.pairs
            .iter()
            .filter_map(PairOutcome::report)
            .map(LinkReport::linked)
            .sum()
    }

    pub fn duplicates(&self) -> usize {
        self.pairs
            .iter()
            .filter_map(PairOutcome::report)
            .map(|report| report.duplicates.len())
            .sum()
    }

    pub fn failed_pairs(&self) -> usize {
        self.pairs.iter().filter(|pair| pair.is_failure()).count()
    }
}

/// Result of linking every library in a tree
#[derive(Debug, Default)]
pub struct LinkSweep {
    pub outcomes: Vec<LibraryLinkOutcome>,
}

impl LinkSweep {
    pub fn failed_pairs(&self) -> usize {
        self.outcomes.iter().map(LibraryLinkOutcome::failed_pairs).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_pairs() == 0
    }
}

/// Links the storages of one library to each other.
///
/// Fewer than two storages is not an error: the outcome simply has no pairs.
/// With `dry_run` nothing is written and each pair's report describes what
/// would have changed.
pub fn link_library(
    tree: &LogicalTree,
    library_id: &str,
    dry_run: bool,
) -> Result<LibraryLinkOutcome, ReplicaError> {
    let library = tree.require(library_id)?;
    Ok(link_storages(library, dry_run))
}

fn link_storages(library: &Library, dry_run: bool) -> LibraryLinkOutcome {
    let mut outcome = LibraryLinkOutcome {
        library_id: library.id.clone(),
        dry_run,
        pairs: Vec::new(),
    };

    if library.storages.len() < 2 {
        info!(
            "Library '{}' has {} storage volume(s), need at least 2 to link",
            library.id,
            library.storages.len()
        );
        return outcome;
    }

    for (source_index, source) in library.storages.iter().enumerate() {
        for (destination_index, destination) in library.storages.iter().enumerate() {
            if source_index == destination_index {
                continue;
            }
            outcome.pairs.push(link_pair(source, destination, dry_run));
        }
    }

    info!(
        "Library '{}': {} link(s) {}, {} duplicate(s), {} failed pair(s)",
        library.id,
        outcome.linked(),
        if dry_run { "planned" } else { "made" },
        outcome.duplicates(),
        outcome.failed_pairs()
    );
    outcome
}

fn link_pair(source: &Volume, destination: &Volume, dry_run: bool) -> PairOutcome {
    let mut pair = PairOutcome {
        source: source.base_path.clone(),
        destination: destination.base_path.clone(),
        mode: None,
        status: PairStatus::Skipped,
    };

    let mode = match destination.descriptor.link_mode() {
        Ok(mode) => mode,
        Err(reason) => {
            warn!(
                "Volume {:?} has an invalid link mode: {}",
                destination.base_path, reason
            );
            pair.status = PairStatus::Failed(SysError::InvalidLinkMode(reason));
            return pair;
        }
    };
    pair.mode = Some(mode);

    if mode.is_none() {
        debug!(
            "Volume {:?} does not accept links, skipping {:?}",
            destination.base_path, source.base_path
        );
        return pair;
    }

    info!(
        "{} {:?} -> {:?} ({})",
        if dry_run { "Previewing" } else { "Linking" },
        source.base_path,
        destination.base_path,
        mode
    );

    let result = if dry_run {
        preview_volume_links(&source.base_path, &destination.base_path, mode)
    } else {
        link_volume(&source.base_path, &destination.base_path, mode)
    };

    pair.status = match result {
        Ok(report) => {
            for failure in &report.failures {
                warn!("{}", failure);
            }
            PairStatus::Linked(report)
        }
        Err(failure) => {
            error!(
                "Failed to link {:?} -> {:?}: {}",
                source.base_path, destination.base_path, failure
            );
            PairStatus::Failed(failure)
        }
    };
    pair
}

/// Runs [`link_library`] over every library.
///
/// Failed pairs in one library do not stop the others; they are counted in
/// each library's outcome. An empty tree is reported as `NotFound`.
pub fn link_all_libraries(tree: &LogicalTree, dry_run: bool) -> Result<LinkSweep, ReplicaError> {
    if tree.is_empty() {
        return Err(ReplicaError::new(
            ReplicaErrorKind::NotFound,
            "no libraries found on any scanned volume",
        ));
    }

    let outcomes = tree
        .libraries()
        .map(|library| link_storages(library, dry_run))
        .collect();
    Ok(LinkSweep { outcomes })
}
