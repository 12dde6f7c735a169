// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Discover media volumes, link storages and generate rclone scripts
#[derive(Debug, Parser)]
#[command(name = "replica", version)]
#[command(about = "Manage media libraries replicated across volumes", long_about = None)]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// User configuration file (defaults to $REPLICA_CONFIG or ~/.replica.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Threads used to scan mount points
    #[arg(long, global = true, value_name = "N")]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect discovered mount points and libraries
    #[command(subcommand)]
    Scan(ScanCommand),

    /// Link files between the storage volumes of a library
    Link {
        /// Library UUID or shortname
        library: Option<String>,
        /// Link every discovered library
        #[arg(long, conflicts_with = "library", required_unless_present = "library")]
        all: bool,
        /// Report what would be linked without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate rclone copy scripts
    Sync {
        /// Plan to generate; both are written when omitted
        #[arg(short, long, value_enum)]
        mode: Option<SyncMode>,
        /// Library UUID or shortname; every library when omitted
        #[arg(short, long)]
        library: Option<String>,
        /// Script path, used as a base name when both plans are written
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Generate a script deleting files from every volume of a library
    Drop {
        /// Paths relative to each volume root
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Library UUID or shortname
        #[arg(long)]
        from: String,
        /// Script path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Manage library shortnames
    #[command(subcommand)]
    Collect(CollectCommand),

    /// Create volume descriptor templates
    #[command(subcommand)]
    Template(TemplateCommand),
}

#[derive(Debug, Subcommand)]
pub enum ScanCommand {
    /// List the roots that are searched for volumes
    Mp,
    /// List libraries with their buffer and storage volumes
    Lib,
}

#[derive(Debug, Subcommand)]
pub enum CollectCommand {
    /// Register a shortname for a library UUID
    Add { short: String, uuid: String },
    /// Remove a registered shortname
    Remove { short: String },
    /// List registered shortnames
    Ls,
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Write a new volume.toml
    New {
        /// Library UUID or shortname; a fresh UUID when omitted
        #[arg(short, long)]
        from: Option<String>,
        /// Where to write the descriptor (defaults to ./volume.toml)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncMode {
    /// Buffers into storages
    Append,
    /// Storages into each other
    Storage,
}
