//! CellStream CLI - Command-line interface
//!
//! This binary provides a command-line interface to the CellStream library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::collect::CollectArgs;
use commands::common::resolve_config_path;
use error::CliError;

#[derive(Parser)]
#[command(name = "cellstream")]
#[command(version, about = "Collect cellular telemetry from adb-bridged phones", long_about = None)]
struct Cli {
    /// Config file (default: ~/.cellstream/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect from every connected device until Ctrl-C
    Collect(CollectArgs),

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());

    let result: Result<(), CliError> = match cli.command {
        Commands::Collect(args) => commands::collect::run(args, &config_path),
        Commands::Init { force } => commands::init::run(&config_path, force),
        Commands::Config => commands::config::run(&config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
