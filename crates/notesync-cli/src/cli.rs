//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use notesync_core::{Strategy, SyncConfig};

/// notesync - Mirror note attachments into a local directory
///
/// Examples:
///   notesync --snapshot export.toml -s Finance          # Sync a stack into the current directory
///   notesync --snapshot export.toml -n Inbox -d ~/notes # Sync a notebook into ~/notes
///   notesync -c notesync.toml --dry-run                 # Show what would change
///   notesync ... --delete -e '.*\.keep'                 # Remove stale files except *.keep
#[derive(Parser, Debug)]
#[command(name = "notesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Local directory to synchronize into (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Stacks to synchronize
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub stacks: Vec<String>,

    /// Notebooks to synchronize
    #[arg(short, long, value_name = "NAME", num_args = 1..)]
    pub notebooks: Vec<String>,

    /// Provider snapshot to read notes from
    #[arg(long, value_name = "FILE", env = "NOTESYNC_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Delete local files and empty directories that are not in the selection
    #[arg(long)]
    pub delete: bool,

    /// Regular expressions for paths that must never be deleted
    #[arg(short = 'e', long = "delete-exclude", value_name = "REGEX")]
    pub delete_excludes: Vec<String>,

    /// How planned operations take effect: apply or preview
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Preview changes without applying them (same as --strategy preview)
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file with defaults (TOML, JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The run settings given on the command line.
    pub fn to_config(&self) -> SyncConfig {
        SyncConfig {
            directory: self.directory.clone(),
            snapshot: self.snapshot.clone(),
            stacks: self.stacks.clone(),
            notebooks: self.notebooks.clone(),
            delete: self.delete,
            delete_excludes: self.delete_excludes.clone(),
            strategy: self.strategy,
            dry_run: self.dry_run,
        }
    }
}
