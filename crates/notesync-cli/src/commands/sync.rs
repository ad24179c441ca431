//! The sync command: snapshot -> plan -> execute

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colored::Colorize;
use notesync_core::{
    EventSink, MemoryNoteStore, OperationFactory, RemoteItemBuilder, Strategy, SyncConfig,
    SyncEvent, TracingSink, scan_directory,
};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Forwards events to tracing and counts failed operations.
#[derive(Debug, Default)]
struct ReportingSink {
    failures: AtomicUsize,
}

impl ReportingSink {
    fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

impl EventSink for ReportingSink {
    fn emit(&self, event: SyncEvent) {
        if event.is_failure() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        TracingSink.emit(event);
    }
}

/// Merge the configuration file (if any) with the command line.
pub fn resolve_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration file");
            SyncConfig::load(path)?
        }
        None => SyncConfig::default(),
    };
    config.merge(cli.to_config());
    config.validate()?;
    Ok(config)
}

/// Absolute local root. Existing directories are canonicalized.
pub fn resolve_root(directory: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let root = match directory {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    if root.exists() {
        if !root.is_dir() {
            return Err(CliError::user(format!(
                "{} exists and is not a directory",
                root.display()
            )));
        }
        Ok(dunce::canonicalize(&root)?)
    } else {
        Ok(root)
    }
}

/// Run the sync command
///
/// Loads the desired state from the snapshot, scans the local root and
/// executes the resulting plan with the configured strategy.
pub fn run_sync(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let root = resolve_root(config.directory.as_deref())?;
    // Compile patterns before touching any state
    let options = config.factory_options(root.to_string_lossy())?;
    let strategy = config.strategy();
    debug!(%strategy, root = %root.display(), "Resolved run settings");

    let snapshot = config
        .snapshot
        .as_deref()
        .ok_or_else(|| CliError::user("a snapshot file is required"))?;

    println!(
        "{} Loading notes from {}",
        "=>".blue().bold(),
        snapshot.display().to_string().cyan()
    );
    let store = Arc::new(MemoryNoteStore::load_snapshot(snapshot)?);
    let builder = RemoteItemBuilder::load(store)?;
    let desired = builder
        .items_for_stacks(config.stacks.as_slice())?
        .merge(builder.items_for_notebooks(config.notebooks.as_slice())?);
    debug!(count = desired.len(), "Desired state:\n{}", desired);

    println!(
        "{} Scanning {}",
        "=>".blue().bold(),
        root.display().to_string().cyan()
    );
    let current = scan_directory(&root);
    debug!(count = current.len(), "Current state:\n{}", current);

    let sink = Arc::new(ReportingSink::default());
    let factory = OperationFactory::new(strategy, options, sink.clone());
    let plan = current.diff(&desired, &factory);
    println!("{} Plan: {}", "=>".blue().bold(), plan.summary());

    let summary = plan.execute();

    match strategy {
        Strategy::Preview => {
            println!(
                "{} Dry run complete. No changes were made.",
                "OK".green().bold()
            );
        }
        Strategy::Apply => {
            println!(
                "{} Synchronized {} item(s) into {}",
                "OK".green().bold(),
                summary.total(),
                root.display()
            );
        }
    }

    let failures = sink.failures();
    if failures > 0 {
        println!(
            "{} {} operation(s) failed. See the log for details.",
            "WARN".yellow().bold(),
            failures
        );
    }

    Ok(())
}
