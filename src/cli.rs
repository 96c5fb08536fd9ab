use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wallshift")]
#[command(author, version, about = "Pick, cache and rotate wallpapers from several image providers")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search providers and list candidates
    Fetch {
        /// Category to search (repeatable; defaults to the configured set)
        #[arg(long = "category", short = 'C')]
        categories: Vec<String>,

        /// Result page to request
        #[arg(long, default_value = "1")]
        page: u32,

        /// Rank candidates and show score breakdowns
        #[arg(long)]
        scores: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pick the best wallpaper, cache it and print its path
    Next {
        /// Category to search (repeatable; defaults to the configured set)
        #[arg(long = "category", short = 'C')]
        categories: Vec<String>,

        /// Screen width in pixels (defaults to [device] width)
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Screen height in pixels (defaults to [device] height)
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Don't record the wallpaper as applied
        #[arg(long)]
        no_mark: bool,
    },

    /// Inspect or trim the local wallpaper cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show recently applied wallpapers
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,

        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Persist a new cache budget in megabytes
    SetCacheSize {
        /// Budget in megabytes
        mb: u64,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Print the current cache size and budget
    Size,
    /// Delete oldest files until the cache fits its budget
    Evict,
    /// Delete every cached file
    Clear,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Forget all history and clear the cache
    Clear,
}
