//! Grantline CLI - resolve and inspect authorization decisions.
//!
//! Works against a JSON authorization document; see `grantline --help`.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use grantline_core::telemetry::{init_telemetry, LogFormat, LoggingConfig};

use commands::{check, config, resolve};
use output::OutputFormat;

/// Grantline - Authorization Resolution Engine CLI
#[derive(Parser)]
#[command(
    name = "grantline",
    version,
    about = "Grantline - Authorization Resolution Engine",
    long_about = "CLI tool for resolving layered authorization records and checking them through the session cache.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log resolver and cache activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a document for one identity
    Resolve(resolve::ResolveArgs),

    /// Check one resource through the caching service
    Check(check::CheckArgs),

    /// Configuration inspection
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.verbose {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Compact,
            ..LoggingConfig::default()
        };
        init_telemetry(&logging, "development")?;
    }

    let format = cli.output;

    let result = match cli.command {
        Commands::Resolve(args) => resolve::execute(args, format).await,
        Commands::Check(args) => check::execute(args, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
