//! CLI command definitions and argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// chemsift - shard a document corpus and keep the entity-dense articles.
#[derive(Debug, Parser)]
#[command(name = "chemsift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: $CHEMSIFT_CONFIG, then ./chemsift.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Move every file under INPUT_DIR into numbered shard directories
    Split(SplitArgs),

    /// Filter one shard, writing kept documents as JSON
    Filter(FilterArgs),

    /// Run one filter process per shard and report the outcome of each
    #[command(name = "run_all", alias = "run-all")]
    RunAll(RunAllArgs),
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    pub input_dir: PathBuf,

    pub output_dir: PathBuf,

    /// Number of shards (default from config: 32)
    #[arg(long = "num_splits", alias = "num-splits")]
    pub num_splits: Option<usize>,

    /// Print the shard assignment as JSON without moving anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    pub shard_dir: PathBuf,

    pub output_dir: PathBuf,

    pub error_log_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct RunAllArgs {
    #[arg(required = true)]
    pub shard_dirs: Vec<PathBuf>,

    /// Shared output directory for kept documents
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for the per-shard error logs
    #[arg(long)]
    pub error_log_dir: Option<PathBuf>,

    /// Upper bound on concurrent filter processes (0 = one per shard)
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}
