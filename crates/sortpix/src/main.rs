//! SortPix CLI - batch image tagging with an object detector and a classifier.
//!
//! SortPix files every image under an input directory into one folder per
//! predicted tag using symbolic links, honours a skip list and manual tags,
//! and reports a macro-F1 score against the manual tags after each run.
//!
//! # Usage
//!
//! ```bash
//! # Tag everything under the configured input directory
//! sortpix run
//!
//! # Tag a different directory with 8 workers
//! sortpix run --input ./photos --output ./sorted --parallel 8
//!
//! # Correct the models for one image, then rescore
//! sortpix tag IMG_0042.jpg dog frisbee
//! sortpix evaluate
//!
//! # View configuration
//! sortpix config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sortpix_core::Config;

mod cli;
mod logging;

/// SortPix - batch image tagging into per-tag shortcut folders.
#[derive(Parser, Debug)]
#[command(name = "sortpix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "SORTPIX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tag every image, build the tag folders, and evaluate
    Run(cli::run::RunArgs),

    /// Score the models against the manual tags without tagging
    Evaluate(cli::evaluate::EvaluateArgs),

    /// Set or clear the manual tags for an image
    Tag(cli::overrides::TagArgs),

    /// Add or remove an image from the skip list
    Skip(cli::overrides::SkipArgs),

    /// List every tag the models can produce
    Labels,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Logging isn't initialized yet, so use eprintln for config warnings.
    // An explicitly requested config file must load; the default may fall back.
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            anyhow::bail!("Failed to load config {}: {e}", config_path.display())
        }
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sortpix config path`."
            );
            Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("SortPix v{}", sortpix_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(config, args).await,
        Commands::Evaluate(args) => cli::evaluate::execute(config, args).await,
        Commands::Tag(args) => cli::overrides::execute_tag(&config, args),
        Commands::Skip(args) => cli::overrides::execute_skip(&config, args),
        Commands::Labels => cli::labels::execute(&config),
        Commands::Config(args) => cli::config::execute(config, &config_path, args),
    }
}
