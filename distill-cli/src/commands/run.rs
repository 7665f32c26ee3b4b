//! `distill run` — ingest an optional extraction payload and execute a
//! consolidation pass.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::Args;
use tracing::error;

use distill_core::config::DistillConfig;
use distill_core::entity::{EntityType, RawEntity};
use distill_core::errors::DistillResult;
use distill_core::models::RunReport;
use distill_core::traits::EntityStore;
use distill_embeddings::EmbeddingEngine;
use distill_engine::ConsolidationOrchestrator;

use crate::CliExitCode;

#[derive(Args)]
pub struct RunArgs {
    /// Entity types to consolidate, comma separated. All types when omitted.
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<EntityType>,

    /// JSON extraction payload to ingest before the pass: a map from
    /// entity type to raw entity records.
    #[arg(long)]
    pub input: Option<std::path::PathBuf>,

    /// Compute everything, write nothing.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: RunArgs, db: &Path, config_path: Option<&Path>) -> CliExitCode {
    match run(args, db, config_path) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    error!(error = %e, "failed to serialize run report");
                    return CliExitCode::Failure;
                }
            }
            if report.metrics.degraded || !report.warnings.is_empty() {
                CliExitCode::Warnings
            } else {
                CliExitCode::Success
            }
        }
        Err(e) => {
            error!(error = %e, "consolidation run failed");
            CliExitCode::Failure
        }
    }
}

fn run(args: RunArgs, db: &Path, config_path: Option<&Path>) -> DistillResult<RunReport> {
    let config = match config_path {
        Some(path) => DistillConfig::load(path)?,
        None => DistillConfig::default(),
    };
    config.validate()?;

    let store = super::open_store(db)?;
    if let Some(input) = &args.input {
        ingest(&store, input)?;
    }

    let embeddings = Arc::new(EmbeddingEngine::from_config(&config.embeddings)?);
    let orchestrator = ConsolidationOrchestrator::new(store, embeddings, config);

    let scope = if args.types.is_empty() {
        None
    } else {
        Some(args.types)
    };
    orchestrator.run(scope, args.dry_run)
}

/// Load an extraction payload: `{ "pain_point": [ {...}, ... ], ... }`.
fn ingest(store: &Arc<dyn EntityStore>, input: &Path) -> DistillResult<usize> {
    let raw = std::fs::read_to_string(input).map_err(|e| {
        distill_core::errors::ConfigError::Unreadable {
            path: input.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    let payload: BTreeMap<EntityType, Vec<RawEntity>> = serde_json::from_str(&raw)?;
    let entities: Vec<RawEntity> = payload.into_values().flatten().collect();
    store.insert_raw_entities(&entities)
}
