//! Check one resource through the caching authorization service.
//!
//! Drives the same path a session would: session start, then a cached
//! lookup of the identity's authorization snapshot.

use anyhow::{Context, Result};
use clap::Args;
use grantline_core::authz::{
    AuthorizationRequirement, EngineAlias, ResolvingFetcher, ResourceCategory, StaticAuthorizationSource,
    UserId,
};
use grantline_core::cache::{CacheStats, CachingAuthorizationService};
use grantline_core::config::Config;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Authorization document (JSON)
    #[arg(short, long, env = "GRANTLINE_DOCUMENT")]
    document: PathBuf,

    /// Configuration file; defaults to GRANTLINE__* environment variables
    #[arg(long, env = "GRANTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// User whose session is checked
    #[arg(short, long)]
    user: String,

    /// Resource category
    #[arg(short, long)]
    category: String,

    /// Relevant permission token (repeatable)
    #[arg(short, long = "permission", required = true)]
    permissions: Vec<String>,

    /// Resource id to check
    #[arg(short, long)]
    resource: String,

    /// Print cache statistics after the check
    #[arg(long)]
    stats: bool,
}

#[derive(Serialize, Tabled)]
struct EngineRow {
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Authorized")]
    authorized: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    user_id: &'a UserId,
    category: &'a ResourceCategory,
    resource: &'a str,
    authorized: bool,
    authorized_engines: Vec<&'a EngineAlias>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<CacheStats>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let path = path
                .to_str()
                .with_context(|| format!("Configuration path {} is not valid UTF-8", path.display()))?;
            Config::from_file(path).with_context(|| format!("Failed to load configuration from {}", path))
        }
        None => Config::load().context("Failed to load configuration from the environment"),
    }
}

pub async fn execute(args: CheckArgs, format: OutputFormat) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let document = super::load_document(&args.document)?;

    let requirement = AuthorizationRequirement::new(args.category, args.permissions);
    let category = requirement.category.clone();
    let source = Arc::new(StaticAuthorizationSource::new(document));
    let fetcher = ResolvingFetcher::new(source, vec![requirement]);
    let service = CachingAuthorizationService::new(fetcher, config.cache)?;

    let user_id = UserId::new(args.user);
    service.on_identity_session_start(&user_id).await?;
    let snapshot = service.get(&user_id).await?;

    let authorized_engines = snapshot.authorized_engines(&category, &args.resource);
    let authorized = !authorized_engines.is_empty();
    let stats = if args.stats { Some(service.stats().await) } else { None };

    match format {
        OutputFormat::Table => {
            let rows: Vec<EngineRow> = snapshot
                .engines()
                .map(|engine| EngineRow {
                    engine: engine.to_string(),
                    authorized: snapshot.is_authorized(engine, &category, &args.resource),
                })
                .collect();
            output::print_list(&rows, format)?;

            if authorized {
                output::print_success(&format!(
                    "{} may access {} '{}'",
                    user_id, category, args.resource
                ));
            } else {
                output::print_denied(&format!(
                    "{} may not access {} '{}' in any engine",
                    user_id, category, args.resource
                ));
            }

            if let Some(stats) = &stats {
                output::print_header("Cache Statistics");
                output::print_detail("Hits", &stats.hits.to_string());
                output::print_detail("Misses", &stats.misses.to_string());
                output::print_detail("Loads", &stats.loads.to_string());
                output::print_detail("Load Failures", &stats.load_failures.to_string());
                output::print_detail("Invalidations", &stats.invalidations.to_string());
                output::print_detail("Entries", &stats.entries.to_string());
                output::print_detail("Hit Rate", &format!("{:.1}%", stats.hit_rate * 100.0));
            }
        }
        _ => {
            let report = CheckReport {
                user_id: &user_id,
                category: &category,
                resource: &args.resource,
                authorized,
                authorized_engines,
                stats,
            };
            output::print_item(&report, format)?;
        }
    }

    Ok(())
}
