// Command line definition.
// Global config/server overrides plus the panel and asset cache subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "schockpanel", version, about = "Schocken admin panel and asset cache")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Game server base URL, overrides the config file
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run the terminal admin panel
    Panel {
        /// Game to administer, overrides the config file
        #[arg(long)]
        game: Option<String>,
    },
    /// Static asset cache
    Assets {
        #[command(subcommand)]
        cmd: AssetCmd,
    },
}

#[derive(Subcommand)]
pub enum AssetCmd {
    /// Fetch assets through the cache
    Fetch {
        /// Absolute URLs or paths relative to the asset origin
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Remove entries unused for longer than the retention period
    Sweep {
        /// Keep running and sweep on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Install and activate the worker, dropping caches of other versions
    Activate,
    /// List cached URLs with their last access
    List,
}
