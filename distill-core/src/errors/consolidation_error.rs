/// Run-level consolidation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConsolidationError {
    #[error("a consolidation run is already in progress")]
    AlreadyRunning,

    #[error("run cancelled after {completed_types} entity type(s)")]
    Cancelled { completed_types: usize },

    #[error("merge failed for cluster with primary {primary_id}: {reason}")]
    MergeFailed { primary_id: String, reason: String },
}
