//! `distill validate` — re-check post-run invariants against current state.

use std::path::Path;

use clap::Args;
use tracing::error;

use distill_engine::validate::validate_store;

use crate::CliExitCode;

#[derive(Args)]
pub struct ValidateArgs {
    /// Scope the checks to one run; checks the whole store when omitted.
    pub audit_id: Option<String>,
}

pub fn execute(args: ValidateArgs, db: &Path) -> CliExitCode {
    let store = match super::open_store(db) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open store");
            return CliExitCode::Failure;
        }
    };

    match validate_store(&store, args.audit_id.as_deref()) {
        Ok(report) => {
            for check in &report.checks {
                let verdict = if check.passed { "pass" } else { "FAIL" };
                println!("{verdict}  {}  {}", check.name, check.detail);
            }
            if report.passed() {
                CliExitCode::Success
            } else {
                CliExitCode::Warnings
            }
        }
        Err(e) => {
            error!(error = %e, "validation failed to run");
            CliExitCode::Failure
        }
    }
}
