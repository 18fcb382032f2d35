//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Savewarden - automated save archival for dedicated game servers
#[derive(Parser, Debug)]
#[command(name = "savewarden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to savewarden.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version(VersionArgs),

    /// List archived backups, newest first
    List(ListArgs),

    /// Restore an archived backup into the live save slot
    Restore(RestoreArgs),

    /// Watch the autosave directory and archive new saves
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show at most N backups (0 shows all)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup index as shown by `savewarden list`
    pub index: usize,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Disable the periodic retention sweep for this run
    #[arg(long)]
    pub no_cleanup: bool,
}
