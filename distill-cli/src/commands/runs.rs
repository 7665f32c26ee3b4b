//! `distill runs` — enumerate audit records, most recent first.

use std::path::Path;

use tracing::error;

use distill_core::traits::EntityStore;

use crate::CliExitCode;

pub fn execute(db: &Path) -> CliExitCode {
    let store = match super::open_store(db) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "failed to open store");
            return CliExitCode::Failure;
        }
    };

    match store.list_audits() {
        Ok(records) => match serde_json::to_string_pretty(&records) {
            Ok(json) => {
                println!("{json}");
                CliExitCode::Success
            }
            Err(e) => {
                error!(error = %e, "failed to serialize audit records");
                CliExitCode::Failure
            }
        },
        Err(e) => {
            error!(error = %e, "failed to list runs");
            CliExitCode::Failure
        }
    }
}
