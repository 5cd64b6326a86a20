//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Live class and method counters for a source tree
#[derive(Parser, Debug)]
#[command(name = "strucount")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, env = "STRUCOUNT_PROJECT_DIR", value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a project and print its structure tree
    Scan {
        /// Project directory (overrides -C)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Apply a TOML event script to a scanned project
    Replay {
        /// Event script
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Project directory (overrides -C)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
        /// Print every tree change notification
        #[arg(short, long)]
        verbose: bool,
    },

    /// Verify the counters of a scanned project against its structure
    Check {
        /// Project directory (overrides -C)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,
}
