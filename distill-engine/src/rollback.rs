//! RollbackManager — undoes a consolidation run from its snapshots.

use std::sync::Arc;

use tracing::info;

use distill_core::errors::{DistillResult, RollbackError};
use distill_core::models::RollbackOutcome;
use distill_core::traits::EntityStore;

pub struct RollbackManager {
    store: Arc<dyn EntityStore>,
}

impl RollbackManager {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Restore every snapshotted raw entity for `audit_id` and remove the
    /// run's consolidated entities, relationships, and patterns, in one
    /// transaction. Rollback is irreversible once re-extraction has run on
    /// the restored state, so it refuses to act without `confirm`.
    pub fn rollback(
        &self,
        audit_id: &str,
        reason: &str,
        confirm: bool,
    ) -> DistillResult<RollbackOutcome> {
        if !confirm {
            return Err(RollbackError::ConfirmationRequired {
                audit_id: audit_id.to_string(),
            }
            .into());
        }

        let outcome = self.store.rollback_run(audit_id, reason)?;
        info!(
            audit_id,
            restored = outcome.restored_entities,
            removed = outcome.removed_consolidated,
            reason,
            "rollback complete"
        );
        Ok(outcome)
    }
}
