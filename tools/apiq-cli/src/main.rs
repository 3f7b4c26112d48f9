//! apiq CLI - Inspect and call declared HTTP APIs.
//!
//! Commands:
//! - `apiq endpoints` - List endpoints and their synthesized operations
//! - `apiq key` - Print the cache key of an endpoint
//! - `apiq call` - Run an aliased operation against the API
//! - `apiq config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use apiq_observability::{init_logging, LogLevel};
use clap::{Parser, Subcommand};

use commands::{CallArgs, ConfigArgs, EndpointsArgs, KeyArgs};

/// apiq - Cached operations for declared HTTP APIs
#[derive(Parser)]
#[command(name = "apiq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List declared endpoints
    Endpoints(EndpointsArgs),

    /// Print the cache key of an endpoint
    Key(KeyArgs),

    /// Call an aliased operation
    Call(CallArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;

    let mut logging = ctx.config.logging;
    if cli.verbose {
        logging.level = logging.level.min(LogLevel::Debug);
    }
    if let Err(e) = init_logging(&logging) {
        ctx.output.warn(&e.to_string());
    }

    let result = match cli.command {
        Commands::Endpoints(args) => commands::endpoints::run(args, &ctx).await,
        Commands::Key(args) => commands::key::run(args, &ctx).await,
        Commands::Call(args) => commands::call::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
