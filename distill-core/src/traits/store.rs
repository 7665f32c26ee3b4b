use crate::entity::{ConsolidatedEntity, EntityType, RawEntity};
use crate::errors::DistillResult;
use crate::models::{AuditRecord, EntitySnapshot, Pattern, Relationship, RollbackOutcome};

/// The persistent store for raw entities, consolidation output, snapshots,
/// and audit records. The transactional boundaries the engine relies on —
/// atomic merge, atomic run rollback — live behind this trait.
pub trait EntityStore: Send + Sync {
    // --- Raw entities ---
    fn insert_raw_entities(&self, entities: &[RawEntity]) -> DistillResult<usize>;
    fn get_raw(&self, id: &str) -> DistillResult<Option<RawEntity>>;
    /// Raw entities of a type not yet absorbed into a consolidated entity.
    fn load_unconsolidated(&self, entity_type: EntityType) -> DistillResult<Vec<RawEntity>>;

    // --- Merge (one transaction: snapshots + consolidated row + markers) ---
    fn commit_merge(
        &self,
        audit_id: &str,
        members: &[RawEntity],
        consolidated: &ConsolidatedEntity,
    ) -> DistillResult<()>;

    // --- Consolidated entities ---
    fn get_consolidated(&self, id: &str) -> DistillResult<Option<ConsolidatedEntity>>;
    fn all_consolidated(&self) -> DistillResult<Vec<ConsolidatedEntity>>;
    fn consolidated_for_run(&self, audit_id: &str) -> DistillResult<Vec<ConsolidatedEntity>>;

    // --- Derived graph output (delete-then-insert per run, idempotent) ---
    fn replace_relationships(
        &self,
        audit_id: &str,
        edges: &[Relationship],
    ) -> DistillResult<usize>;
    fn relationships_for_run(&self, audit_id: &str) -> DistillResult<Vec<Relationship>>;
    fn all_relationships(&self) -> DistillResult<Vec<Relationship>>;
    fn replace_patterns(&self, audit_id: &str, patterns: &[Pattern]) -> DistillResult<usize>;
    fn patterns_for_run(&self, audit_id: &str) -> DistillResult<Vec<Pattern>>;

    // --- Snapshots ---
    fn snapshots_for_run(&self, audit_id: &str) -> DistillResult<Vec<EntitySnapshot>>;

    // --- Audit records ---
    fn insert_audit(&self, record: &AuditRecord) -> DistillResult<()>;
    fn update_audit(&self, record: &AuditRecord) -> DistillResult<()>;
    fn get_audit(&self, audit_id: &str) -> DistillResult<Option<AuditRecord>>;
    fn list_audits(&self) -> DistillResult<Vec<AuditRecord>>;

    // --- Rollback (one transaction: restore raws + delete run output) ---
    fn rollback_run(&self, audit_id: &str, reason: &str) -> DistillResult<RollbackOutcome>;
}
