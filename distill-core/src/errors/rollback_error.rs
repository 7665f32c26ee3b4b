/// Rollback preconditions. Rollback is irreversible once re-extraction has
/// occurred on the restored state, so every guard is an explicit error,
/// never a silent no-op.
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    #[error("unknown audit id: {audit_id}")]
    UnknownAudit { audit_id: String },

    #[error("run {audit_id} has already been rolled back")]
    AlreadyRolledBack { audit_id: String },

    #[error("run {audit_id} is still active and cannot be rolled back")]
    RunStillActive { audit_id: String },

    #[error("rollback of {audit_id} requires explicit confirmation")]
    ConfirmationRequired { audit_id: String },
}
