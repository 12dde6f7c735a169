// SPDX-License-Identifier: GPL-3.0-only

//! Subcommand handlers
//!
//! Each invocation scans the machine afresh; nothing is cached between runs.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow, bail};
use replica_library::{
    LibraryLinkOutcome, LogicalTree, PairStatus, Resolution, Volume, build_append,
    build_append_all, build_drop, build_logical_tree, build_sync, build_sync_all,
    link_all_libraries, link_library, resolve_library_id,
};
use replica_sys::{
    RCloneCli, SystemMounts, UserConfigFile, build_physical_tree, scan_roots, write_descriptor,
};
use replica_types::{Collection, DESCRIPTOR_FILE_NAME, ScanConfig, VolumeDescriptor};
use tracing::{debug, info, warn};

use crate::cli::{CollectCommand, Command, ScanCommand, SyncMode, TemplateCommand};
use crate::script::{self, DROP_NOTICE, ScriptKind};

/// State shared by every subcommand of one invocation
pub struct Context {
    pub user_config: UserConfigFile,
    pub scan: ScanConfig,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, threads: Option<usize>) -> Self {
        let user_config = config_path.map(UserConfigFile::new).unwrap_or_default();
        let scan = match threads {
            Some(threads) => ScanConfig::default().with_threads(threads),
            None => ScanConfig::default(),
        };
        Self { user_config, scan }
    }

    fn logical_tree(&self) -> LogicalTree {
        let physical = build_physical_tree(&SystemMounts, &self.user_config, &self.scan);
        build_logical_tree(&physical)
    }

    fn resolve(&self, input: &str) -> String {
        let resolution = resolve_library_id(input, &self.user_config);
        if let Resolution::Shortname { short, id } = &resolution {
            info!("Using library '{}' for shortname '{}'", id, short);
        }
        resolution.id().to_string()
    }
}

pub fn run(context: &Context, command: Command) -> Result<()> {
    match command {
        Command::Scan(ScanCommand::Mp) => scan_mount_points(context),
        Command::Scan(ScanCommand::Lib) => scan_libraries(context),
        Command::Link {
            library,
            all,
            dry_run,
        } => link(context, library.as_deref(), all, dry_run),
        Command::Sync {
            mode,
            library,
            output,
        } => sync(context, mode, library.as_deref(), output.as_deref()),
        Command::Drop {
            paths,
            from,
            output,
        } => drop_files(context, &paths, &from, output.as_deref()),
        Command::Collect(command) => collect(context, command),
        Command::Template(TemplateCommand::New {
            from,
            output,
            force,
        }) => template_new(context, from.as_deref(), output, force),
    }
}

fn scan_mount_points(context: &Context) -> Result<()> {
    let roots = scan_roots(&SystemMounts, &context.user_config)?;
    if roots.is_empty() {
        println!("No mount points found.");
        return Ok(());
    }

    println!("--- Scan roots ---");
    for root in roots {
        println!("- {}", root.display());
    }
    Ok(())
}

fn print_volumes(label: &str, volumes: &[Volume]) {
    println!("  {} ({}):", label, volumes.len());
    if volumes.is_empty() {
        println!("    (none)");
    }
    for volume in volumes {
        println!("    - {}", volume.base_path.display());
        let note = volume.descriptor.note();
        if !note.is_empty() {
            println!("      Note: {}", note);
        }
        let arguments = volume.descriptor.rclone_arguments();
        if !arguments.is_empty() {
            println!("      Rclone arguments: \"{}\"", arguments);
        }
        match volume.descriptor.link_mode() {
            Ok(mode) if !mode.is_none() => println!("      Link mode: {}", mode),
            Ok(_) => {}
            Err(reason) => println!("      Link mode: invalid ({})", reason),
        }
    }
}

fn scan_libraries(context: &Context) -> Result<()> {
    let tree = context.logical_tree();
    if tree.is_empty() {
        println!(
            "No libraries found. Check that {} files are placed under <mount>/volumes/.",
            DESCRIPTOR_FILE_NAME
        );
        return Ok(());
    }

    println!("--- Libraries ---");
    for library in tree.libraries() {
        println!("Library: {}", library.id);
        print_volumes("Buffers", &library.buffers);
        print_volumes("Storages", &library.storages);
        println!();
    }
    Ok(())
}

fn print_link_outcome(outcome: &LibraryLinkOutcome) {
    println!("Library: {}", outcome.library_id);
    if outcome.pairs.is_empty() {
        println!("  fewer than two storage volumes, nothing to link");
        return;
    }

    for pair in &outcome.pairs {
        let status = match &pair.status {
            PairStatus::Skipped => "skipped (destination link mode is none)".to_string(),
            PairStatus::Failed(error) => format!("failed: {}", error),
            PairStatus::Linked(report) => format!(
                "{} {}, {} replaced, {} already present, {} failed",
                report.created.len(),
                if outcome.dry_run { "to create" } else { "created" },
                report.replaced.len(),
                report.duplicates.len(),
                report.failures.len()
            ),
        };
        println!(
            "  {} -> {}: {}",
            pair.source.display(),
            pair.destination.display(),
            status
        );

        if !outcome.dry_run {
            continue;
        }
        if let PairStatus::Linked(report) = &pair.status {
            for path in report.created.iter().chain(&report.replaced) {
                println!("    {}", path.display());
            }
        }
    }
}

fn link(context: &Context, library: Option<&str>, all: bool, dry_run: bool) -> Result<()> {
    if dry_run {
        info!("Dry run: the filesystem will not be modified");
    }

    let tree = context.logical_tree();

    let failed = if all {
        let sweep = link_all_libraries(&tree, dry_run)?;
        for outcome in &sweep.outcomes {
            print_link_outcome(outcome);
        }
        sweep.failed_pairs()
    } else {
        let input = library.ok_or_else(|| anyhow!("specify a library or use --all"))?;
        let library_id = context.resolve(input);
        let outcome = link_library(&tree, &library_id, dry_run)
            .with_context(|| format!("cannot link '{}'", input))?;
        print_link_outcome(&outcome);
        outcome.failed_pairs()
    };

    if failed > 0 {
        bail!("linking finished with {} failure(s)", failed);
    }
    Ok(())
}

fn warn_if_rclone_missing() {
    match RCloneCli::new() {
        Ok(rclone) => debug!("Generated scripts will run {:?}", rclone.binary_path()),
        Err(error) => warn!("{}; generated scripts need it to run", error),
    }
}

fn sync(
    context: &Context,
    mode: Option<SyncMode>,
    library: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    warn_if_rclone_missing();

    let tree = context.logical_tree();
    let library_id = library.map(|input| context.resolve(input));
    if let Some(id) = &library_id {
        tree.require(id)?;
    }

    let kinds: &[ScriptKind] = match mode {
        Some(SyncMode::Append) => &[ScriptKind::Append],
        Some(SyncMode::Storage) => &[ScriptKind::Storage],
        None => &[ScriptKind::Append, ScriptKind::Storage],
    };
    let several = kinds.len() > 1;

    let mut written = 0;
    for &kind in kinds {
        let commands = match (kind, library_id.as_deref()) {
            (ScriptKind::Append, Some(id)) => build_append(&tree, id)?,
            (ScriptKind::Append, None) => build_append_all(&tree),
            (ScriptKind::Storage, Some(id)) => build_sync(&tree, id)?,
            (ScriptKind::Storage, None) => build_sync_all(&tree),
            (ScriptKind::Drop, _) => continue,
        };

        if commands.is_empty() {
            warn!("No '{}' commands generated, check volume configurations", kind);
            continue;
        }

        let path = script::script_path(kind, library_id.as_deref(), output, several);
        script::write_script(&path, &[], &commands)?;
        println!(
            "Wrote '{}' script with {} command(s): {}",
            kind,
            commands.len(),
            path.display()
        );
        written += 1;
    }

    if written > 0 {
        println!("Review the generated script(s) before running them.");
    }
    Ok(())
}

fn drop_files(
    context: &Context,
    paths: &[PathBuf],
    from: &str,
    output: Option<&Path>,
) -> Result<()> {
    warn_if_rclone_missing();

    let tree = context.logical_tree();
    let library_id = context.resolve(from);
    let commands = build_drop(&tree, &library_id, paths)?;
    if commands.is_empty() {
        bail!("library '{}' has no volumes to drop files from", library_id);
    }

    let path = script::script_path(ScriptKind::Drop, Some(&library_id), output, false);
    script::write_script(&path, DROP_NOTICE, &commands)?;
    println!("Wrote deletion script: {}", path.display());
    println!("Commands run with --dry-run; review the script and remove the flag to delete.");
    Ok(())
}

fn collect(context: &Context, command: CollectCommand) -> Result<()> {
    let store = &context.user_config;
    let mut config = store.load()?;

    match command {
        CollectCommand::Add { short, uuid } => {
            config
                .add_collection(Collection::new(short.as_str(), uuid.as_str()))
                .map_err(|reason| anyhow!(reason))?;
            store.save(&config)?;
            println!("Added collection '{}' -> {}", short, uuid);
        }
        CollectCommand::Remove { short } => {
            if config.remove_collection(&short).is_none() {
                bail!("collection '{}' not found in {}", short, store.path().display());
            }
            store.save(&config)?;
            println!("Removed collection '{}'", short);
        }
        CollectCommand::Ls => {
            if config.collections.is_empty() {
                println!("No collections in {}", store.path().display());
            }
            for collection in &config.collections {
                println!("{}\t{}", collection.short, collection.uuid);
            }
        }
    }
    Ok(())
}

fn template_new(
    context: &Context,
    from: Option<&str>,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => env::current_dir()
            .context("failed to read current directory")?
            .join(DESCRIPTOR_FILE_NAME),
    };

    if path.exists() && !force {
        bail!("{} already exists, pass --force to replace it", path.display());
    }

    let library_id = from.map(|input| context.resolve(input));
    let descriptor = VolumeDescriptor::template(library_id.as_deref());
    write_descriptor(&path, &descriptor)?;

    println!(
        "Wrote volume template for library {} at {}",
        descriptor.library_id(),
        path.display()
    );
    Ok(())
}
