// SPDX-License-Identifier: GPL-3.0-only

//! Library-level operations over a scanned physical tree
//!
//! - [`logical`]: groups volumes by library and role
//! - [`resolve`]: turns shortnames into library identifiers
//! - [`linker`]: links storages of a library to each other
//! - [`planner`]: renders append, sync and drop plans as rclone commands
//!
//! Everything here is single-threaded and works on a frozen snapshot; the
//! concurrent scan lives in `replica-sys`.

pub mod linker;
pub mod logical;
pub mod planner;
pub mod resolve;

pub use linker::{
    LibraryLinkOutcome, LinkSweep, PairOutcome, PairStatus, link_all_libraries, link_library,
};
pub use logical::{Library, LogicalTree, Volume, build_logical_tree};
pub use planner::{
    DROP_SAFETY_ARGUMENTS, build_append, build_append_all, build_drop, build_sync,
    build_sync_all,
};
pub use resolve::{Resolution, resolve_library_id};
