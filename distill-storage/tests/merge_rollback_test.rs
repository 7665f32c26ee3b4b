//! Integration test: atomic merge, snapshot capture, run rollback.

use std::collections::BTreeSet;

use chrono::Utc;
use distill_core::entity::attributes::PainPointAttributes;
use distill_core::entity::{
    Confidence, ConsolidatedEntity, EntityType, RawEntity, TypedAttributes,
};
use distill_core::errors::{DistillError, RollbackError};
use distill_core::models::{AuditRecord, RunStatus};
use distill_core::traits::EntityStore;
use distill_storage::StorageEngine;

fn make_raw(id: &str, interview: &str) -> RawEntity {
    RawEntity {
        id: id.to_string(),
        entity_type: EntityType::PainPoint,
        org_id: "org-a".to_string(),
        source_interview_id: interview.to_string(),
        name: "late invoicing".to_string(),
        description: "invoices go out weeks late".to_string(),
        attributes: TypedAttributes::PainPoint(PainPointAttributes::default()),
        extracted_at: Utc::now(),
    }
}

fn make_consolidated(id: &str, audit_id: &str, interviews: &[&str]) -> ConsolidatedEntity {
    let mentioned: BTreeSet<String> = interviews.iter().map(|s| s.to_string()).collect();
    ConsolidatedEntity {
        id: id.to_string(),
        entity_type: EntityType::PainPoint,
        org_id: "org-a".to_string(),
        name: "late invoicing".to_string(),
        description: "invoices go out weeks late".to_string(),
        attributes: TypedAttributes::PainPoint(PainPointAttributes::default()),
        source_count: mentioned.len(),
        mentioned_in_interviews: mentioned,
        consensus_confidence: Confidence::new(0.5),
        contradiction_flag: false,
        contradicting_sources: vec![],
        audit_id: audit_id.to_string(),
        consolidated_at: Utc::now(),
    }
}

fn completed_audit(engine: &StorageEngine, audit_id: &str) {
    let mut record = AuditRecord::open(audit_id.to_string(), vec![EntityType::PainPoint]);
    engine.insert_audit(&record).unwrap();
    record.status = RunStatus::Completed;
    record.finished_at = Some(Utc::now());
    engine.update_audit(&record).unwrap();
}

#[test]
fn merge_writes_snapshots_consolidated_and_markers_together() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let members = vec![make_raw("r1", "i1"), make_raw("r2", "i2")];
    engine.insert_raw_entities(&members).unwrap();

    let consolidated = make_consolidated("c1", "audit-1", &["i1", "i2"]);
    engine.commit_merge("audit-1", &members, &consolidated).unwrap();

    let snapshots = engine.snapshots_for_run("audit-1").unwrap();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots.iter().all(|s| s.consolidated_id == "c1"));

    let stored = engine.get_consolidated("c1").unwrap().unwrap();
    assert_eq!(stored.source_count, 2);
    assert!(stored.source_accounting_ok());

    // Members are absorbed: nothing left to consolidate.
    assert!(engine
        .load_unconsolidated(EntityType::PainPoint)
        .unwrap()
        .is_empty());
}

#[test]
fn failed_merge_leaves_no_partial_state() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let members = vec![make_raw("r1", "i1"), make_raw("r2", "i2")];
    engine.insert_raw_entities(&members).unwrap();

    let consolidated = make_consolidated("c1", "audit-1", &["i1", "i2"]);
    engine.commit_merge("audit-1", &members, &consolidated).unwrap();

    // Same consolidated id again: the insert inside the transaction fails on
    // the primary key, and the whole second merge must vanish.
    let err = engine.commit_merge("audit-1", &members, &consolidated);
    assert!(err.is_err());
    assert_eq!(engine.snapshots_for_run("audit-1").unwrap().len(), 2);
}

#[test]
fn rollback_restores_raw_entities_byte_for_byte() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let members = vec![make_raw("r1", "i1"), make_raw("r2", "i2")];
    engine.insert_raw_entities(&members).unwrap();
    let before: Vec<String> = members
        .iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect();

    let consolidated = make_consolidated("c1", "audit-1", &["i1", "i2"]);
    engine.commit_merge("audit-1", &members, &consolidated).unwrap();
    completed_audit(&engine, "audit-1");

    let outcome = engine.rollback_run("audit-1", "bad merge").unwrap();
    assert_eq!(outcome.restored_entities, 2);
    assert_eq!(outcome.removed_consolidated, 1);

    // The consolidated entity is gone and the raws are available again,
    // identical to their pre-merge serialization.
    assert!(engine.get_consolidated("c1").unwrap().is_none());
    let restored = engine.load_unconsolidated(EntityType::PainPoint).unwrap();
    assert_eq!(restored.len(), 2);
    for (member, serialized) in restored.iter().zip(before.iter()) {
        assert_eq!(&serde_json::to_string(member).unwrap(), serialized);
    }

    let record = engine.get_audit("audit-1").unwrap().unwrap();
    assert_eq!(record.status, RunStatus::RolledBack);
    assert_eq!(record.rollback_reason.as_deref(), Some("bad merge"));

    // Snapshots outlive the rollback; only explicit retention cleanup
    // removes them.
    assert_eq!(engine.snapshots_for_run("audit-1").unwrap().len(), 2);
    engine
        .pool()
        .writer
        .with_conn(|conn| {
            let removed =
                distill_storage::queries::snapshot_ops::delete_for_run(conn, "audit-1")?;
            assert_eq!(removed, 2);
            Ok(())
        })
        .unwrap();
    assert!(engine.snapshots_for_run("audit-1").unwrap().is_empty());
}

#[test]
fn second_rollback_is_an_explicit_error() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let members = vec![make_raw("r1", "i1")];
    engine.insert_raw_entities(&members).unwrap();
    let consolidated = make_consolidated("c1", "audit-1", &["i1"]);
    engine.commit_merge("audit-1", &members, &consolidated).unwrap();
    completed_audit(&engine, "audit-1");

    engine.rollback_run("audit-1", "first").unwrap();
    let second = engine.rollback_run("audit-1", "second");
    assert!(matches!(
        second,
        Err(DistillError::Rollback(RollbackError::AlreadyRolledBack { .. }))
    ));
}

#[test]
fn rollback_of_unknown_audit_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let result = engine.rollback_run("no-such-run", "reason");
    assert!(matches!(
        result,
        Err(DistillError::Rollback(RollbackError::UnknownAudit { .. }))
    ));
}

#[test]
fn rollback_of_active_run_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let record = AuditRecord::open("audit-live".to_string(), vec![EntityType::PainPoint]);
    engine.insert_audit(&record).unwrap();
    let result = engine.rollback_run("audit-live", "reason");
    assert!(matches!(
        result,
        Err(DistillError::Rollback(RollbackError::RunStillActive { .. }))
    ));
}
