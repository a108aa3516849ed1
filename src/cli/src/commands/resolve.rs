//! Resolve an authorization document for one identity.
//!
//! Runs the resolver per engine and prints the decision plus a verdict for
//! every candidate resource.

use anyhow::Result;
use clap::Args;
use grantline_core::authz::{
    AuthorizationRecord, AuthorizationRequirement, EngineAlias, GroupId, IdentityAuthorizations,
    IdentityContext, ResolvedResourceAuthorization, ResourceCategory, UserId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ResolveArgs {
    /// Authorization document (JSON)
    #[arg(short, long, env = "GRANTLINE_DOCUMENT")]
    document: PathBuf,

    /// User to resolve for
    #[arg(short, long)]
    user: String,

    /// Group membership; defaults to the user's memberships in the document
    #[arg(short, long = "group")]
    groups: Vec<String>,

    /// Resource category
    #[arg(short, long)]
    category: String,

    /// Relevant permission token (repeatable)
    #[arg(short, long = "permission", required = true)]
    permissions: Vec<String>,

    /// Only resolve this engine
    #[arg(short, long)]
    engine: Option<String>,

    /// Candidate resource id to check (repeatable)
    #[arg(short, long = "resource")]
    resources: Vec<String>,
}

#[derive(Serialize, Tabled)]
struct DecisionRow {
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Grant All")]
    grant_all: bool,
    #[tabled(rename = "Allowed")]
    allowed: String,
    #[tabled(rename = "Prohibited")]
    prohibited: String,
}

#[derive(Serialize, Tabled)]
struct VerdictRow {
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Authorized")]
    authorized: bool,
}

#[derive(Serialize)]
struct EngineReport<'a> {
    engine: &'a EngineAlias,
    decision: &'a ResolvedResourceAuthorization,
    verdicts: BTreeMap<&'a str, bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport<'a> {
    user_id: &'a UserId,
    group_ids: Vec<&'a GroupId>,
    category: &'a ResourceCategory,
    engines: Vec<EngineReport<'a>>,
}

pub async fn execute(args: ResolveArgs, format: OutputFormat) -> Result<()> {
    let document = super::load_document(&args.document)?;
    let user_id = UserId::new(args.user);

    let identity = if args.groups.is_empty() {
        let groups = document.memberships.get(&user_id).cloned().unwrap_or_default();
        IdentityContext::new(user_id.clone()).with_groups(groups)
    } else {
        IdentityContext::new(user_id.clone()).with_groups(args.groups)
    };

    let mut records_by_engine: BTreeMap<EngineAlias, Vec<AuthorizationRecord>> = document
        .engines
        .iter()
        .map(|engine| (engine.clone(), Vec::new()))
        .collect();
    for record in document.records {
        records_by_engine
            .entry(record.engine_alias.clone())
            .or_default()
            .push(record);
    }
    if let Some(engine) = args.engine {
        let engine = EngineAlias::new(engine);
        let records = records_by_engine.remove(&engine).unwrap_or_default();
        if records.is_empty() {
            output::print_info(&format!("Engine '{}' has no records; nothing will be authorized", engine));
        }
        records_by_engine = BTreeMap::from([(engine, records)]);
    }

    let requirement = AuthorizationRequirement::new(args.category, args.permissions);
    let snapshot = IdentityAuthorizations::resolve(
        &identity,
        records_by_engine.iter().map(|(engine, records)| (engine, records.as_slice())),
        std::slice::from_ref(&requirement),
    );

    let decisions: Vec<(&EngineAlias, &ResolvedResourceAuthorization)> = snapshot
        .engines()
        .filter_map(|engine| {
            snapshot
                .decision(engine, &requirement.category)
                .map(|decision| (engine, decision))
        })
        .collect();

    match format {
        OutputFormat::Table => {
            output::print_header(&format!("Authorization for {} on {}", user_id, requirement.category));
            let rows: Vec<DecisionRow> = decisions
                .iter()
                .map(|(engine, decision)| DecisionRow {
                    engine: engine.to_string(),
                    grant_all: decision.grant_all(),
                    allowed: output::join_ids(decision.allowed()),
                    prohibited: output::join_ids(decision.prohibited()),
                })
                .collect();
            output::print_table(&rows);

            if !args.resources.is_empty() {
                let verdicts: Vec<VerdictRow> = decisions
                    .iter()
                    .flat_map(|(engine, decision)| {
                        args.resources.iter().map(move |resource| VerdictRow {
                            engine: engine.to_string(),
                            resource: resource.clone(),
                            authorized: decision.is_authorized(resource),
                        })
                    })
                    .collect();
                output::print_header("Verdicts");
                output::print_table(&verdicts);
            }
        }
        _ => {
            let mut group_ids: Vec<&GroupId> = identity.group_ids.iter().collect();
            group_ids.sort();
            let report = ResolveReport {
                user_id: &user_id,
                group_ids,
                category: &requirement.category,
                engines: decisions
                    .iter()
                    .map(|(engine, decision)| EngineReport {
                        engine,
                        decision,
                        verdicts: args
                            .resources
                            .iter()
                            .map(|resource| (resource.as_str(), decision.is_authorized(resource)))
                            .collect(),
                    })
                    .collect(),
            };
            output::print_item(&report, format)?;
        }
    }

    Ok(())
}
