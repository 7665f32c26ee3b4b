//! `distill rollback` — undo a prior run. Destructive and irreversible, so
//! the `--confirm` flag is mandatory.

use std::path::Path;

use clap::Args;
use tracing::error;

use distill_engine::RollbackManager;

use crate::CliExitCode;

#[derive(Args)]
pub struct RollbackArgs {
    /// Audit id of the run to undo.
    pub audit_id: String,

    /// Why this run is being rolled back (recorded on the audit row).
    #[arg(long)]
    pub reason: String,

    /// Required acknowledgement that the rollback is destructive.
    #[arg(long)]
    pub confirm: bool,
}

pub fn execute(args: RollbackArgs, db: &Path) -> CliExitCode {
    let store = match super::open_store(db) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open store");
            return CliExitCode::Failure;
        }
    };

    let manager = RollbackManager::new(store);
    match manager.rollback(&args.audit_id, &args.reason, args.confirm) {
        Ok(outcome) => match serde_json::to_string_pretty(&outcome) {
            Ok(json) => {
                println!("{json}");
                CliExitCode::Success
            }
            Err(e) => {
                error!(error = %e, "failed to serialize rollback outcome");
                CliExitCode::Failure
            }
        },
        Err(e) => {
            error!(error = %e, "rollback refused");
            CliExitCode::Failure
        }
    }
}
