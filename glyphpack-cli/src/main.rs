//! glyphpack CLI - build icon fonts from SVG glyphs
//!
//! Settings come from `glyphpack.ini` (see `glyphpack config path`);
//! command-line flags override the file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::build::BuildArgs;
use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "glyphpack", version, about = "Build icon fonts from SVG glyphs")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the font bundle from a set of SVG files
    Build(BuildArgs),

    /// Inspect or clear the build cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        /// Cache file (defaults to the configured cache)
        #[arg(long, global = true, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Show configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Build(args) => commands::build::run(args, config_path),
        Commands::Cache { action, file } => commands::cache::run(action, file, config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
