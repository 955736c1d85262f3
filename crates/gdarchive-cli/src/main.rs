//! gdarchive CLI - Archive a Google Drive account to a local directory
//!
//! Provides commands for:
//! - Downloading every file, exporting native documents
//! - Previewing the local layout without downloading
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gdarchive_core::config::Config;

mod commands;
mod output;

use commands::{archive::ArchiveCommand, config::ConfigCommand, tree::TreeCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "gdarchive", version, about = "Incremental Google Drive archiver")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download the drive into a local directory
    Archive(ArchiveCommand),
    /// Print the local layout an archive run would produce
    Tree(TreeCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match &cli.config {
        // An explicit file must load
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&config_path),
    };

    init_tracing(cli.verbose, cli.log_json, &config.logging.level);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Archive(cmd) => cmd.execute(&config, format).await,
        Commands::Tree(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config, &config_path, format).await,
    }
}

fn init_tracing(verbose: u8, json: bool, configured_level: &str) {
    let filter = match verbose {
        0 => configured_level,
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
