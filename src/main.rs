// ABOUTME: Entry point for the image-sync CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::PurgeTargets;
use image_sync::config::{self, Config};
use image_sync::error::Result;
use image_sync::output::{Output, OutputMode};
use image_sync::runtime::RuntimeConfig;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = output_mode(&cli);
    let result = run(cli, mode).await;

    if let Err(e) = result {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let flags = RuntimeConfig {
        runtime: cli.runtime,
        socket: cli.socket,
    };

    match cli.command {
        Commands::Init { registry, force } => {
            let cwd = env::current_dir()?;
            let path = config::init_config(&cwd, registry.as_deref(), force)?;
            Output::new(mode).success(&format!("Created {}", path.display()));
            Ok(())
        }
        Commands::Sync {
            config,
            dry_run,
            show_push,
            direction,
        } => {
            let config = match config {
                Some(path) => Config::load(&path)?,
                None => Config::discover(&env::current_dir()?)?,
            };
            let output = Output::new(mode).show_push(show_push);
            commands::sync(config, direction, dry_run, flags, output).await
        }
        Commands::Purge {
            names,
            ids,
            dangling,
        } => {
            let targets = PurgeTargets {
                names,
                ids,
                dangling,
            };
            commands::purge(targets, flags, Output::new(mode)).await
        }
    }
}
