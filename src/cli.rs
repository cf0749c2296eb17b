// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use image_sync::runtime::RuntimeType;
use image_sync::types::SyncDirection;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-sync")]
#[command(about = "Mirror container images between registries and purge unused local images")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and the final result
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Container runtime to use (detected when omitted)
    #[arg(long, global = true, value_enum)]
    pub runtime: Option<RuntimeType>,

    /// Path to the runtime socket
    #[arg(long, global = true)]
    pub socket: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new sync.yml configuration file
    Init {
        /// Registry to mirror into
        #[arg(long)]
        registry: Option<String>,

        /// Overwrite an existing sync.yml
        #[arg(long)]
        force: bool,
    },

    /// Pull, retag and push every image listed in the configuration
    Sync {
        /// Configuration file (defaults to sync.yml in the current directory)
        config: Option<PathBuf>,

        /// Log every stage without touching the runtime
        #[arg(long)]
        dry_run: bool,

        /// Print the records returned by each push
        #[arg(long)]
        show_push: bool,

        /// Override the direction set in the configuration
        #[arg(long, value_enum)]
        direction: Option<SyncDirection>,
    },

    /// Remove local images that no container uses
    Purge {
        /// Image names to remove
        names: Vec<String>,

        /// Image ids (or id prefixes of at least 12 digits) to remove
        #[arg(long = "id", value_name = "ID")]
        ids: Vec<String>,

        /// Remove every untagged image
        #[arg(long)]
        dangling: bool,
    },
}
