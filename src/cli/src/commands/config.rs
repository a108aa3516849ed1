//! Configuration inspection commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use grantline_core::config::Config;
use std::path::PathBuf;

use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Configuration file; defaults to GRANTLINE__* environment variables
        #[arg(short, long, env = "GRANTLINE_CONFIG")]
        file: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file
        file: PathBuf,
    },
}

fn load(file: Option<&PathBuf>) -> Result<Config> {
    match file {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("Configuration path {} is not valid UTF-8", path.display()))?;
            Config::from_file(path).with_context(|| format!("Invalid configuration in {}", path))
        }
        None => Config::load().context("Invalid configuration in environment"),
    }
}

pub async fn execute(cmd: ConfigCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show { file } => {
            let config = load(file.as_ref())?;
            match format {
                OutputFormat::Table => {
                    output::print_header("Grantline Configuration");
                    output::print_detail("Environment", &config.environment);
                    output::print_detail("Cache Max Entries", &config.cache.max_entries.to_string());
                    output::print_detail("Cache TTL", &format!("{}s", config.cache.ttl.as_secs()));
                    output::print_detail("Log Level", &config.logging.level);
                    output::print_detail("Log Format", &format!("{:?}", config.logging.format));
                }
                _ => output::print_item(&config, format)?,
            }
        }
        ConfigCommands::Validate { file } => {
            load(Some(&file))?;
            output::print_success(&format!("{} is valid", file.display()));
        }
    }
    Ok(())
}
