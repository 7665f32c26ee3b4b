//! Merge-then-rollback round trip through the orchestrator and manager.

use std::sync::Arc;

use chrono::Utc;
use distill_core::config::{DistillConfig, EmbeddingConfig};
use distill_core::entity::attributes::PainPointAttributes;
use distill_core::entity::{EntityType, RawEntity, TypedAttributes};
use distill_core::errors::{DistillError, RollbackError};
use distill_core::models::RunStatus;
use distill_core::traits::EntityStore;
use distill_embeddings::{EmbeddingEngine, HashedProvider};
use distill_engine::{ConsolidationOrchestrator, RollbackManager};
use distill_storage::StorageEngine;

fn make_pain(id: &str, interview: &str) -> RawEntity {
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

fn setup() -> (Arc<dyn EntityStore>, ConsolidationOrchestrator) {
    let store: Arc<dyn EntityStore> = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embeddings = Arc::new(EmbeddingEngine::new(
        Box::new(HashedProvider::default()),
        &EmbeddingConfig::default(),
    ));
    let orchestrator = ConsolidationOrchestrator::new(
        Arc::clone(&store),
        embeddings,
        DistillConfig::default(),
    );
    (store, orchestrator)
}

#[test]
fn rollback_restores_the_pre_merge_state_exactly() {
    let (store, orchestrator) = setup();
    let entities = vec![make_pain("pp-1", "i1"), make_pain("pp-2", "i2")];
    let before: Vec<String> = entities
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    store.insert_raw_entities(&entities).unwrap();

    let report = orchestrator.run(None, false).unwrap();
    assert_eq!(report.metrics.entities_merged, 1);
    assert!(store
        .load_unconsolidated(EntityType::PainPoint)
        .unwrap()
        .is_empty());

    let manager = RollbackManager::new(Arc::clone(&store));
    let outcome = manager.rollback(&report.audit_id, "test rollback", true).unwrap();
    assert_eq!(outcome.restored_entities, 2);
    assert_eq!(outcome.removed_consolidated, 1);

    // Byte-for-byte: the restored raw entities serialize identically to the
    // originals, and the consolidated output is gone.
    let restored = store.load_unconsolidated(EntityType::PainPoint).unwrap();
    let after: Vec<String> = restored
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    assert_eq!(before, after);
    assert!(store.consolidated_for_run(&report.audit_id).unwrap().is_empty());
    assert!(store.relationships_for_run(&report.audit_id).unwrap().is_empty());
    assert!(store.patterns_for_run(&report.audit_id).unwrap().is_empty());

    let record = store.get_audit(&report.audit_id).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::RolledBack);
}

#[test]
fn second_rollback_on_the_same_run_errors() {
    let (store, orchestrator) = setup();
    store
        .insert_raw_entities(&[make_pain("pp-1", "i1"), make_pain("pp-2", "i2")])
        .unwrap();
    let report = orchestrator.run(None, false).unwrap();

    let manager = RollbackManager::new(Arc::clone(&store));
    manager.rollback(&report.audit_id, "first", true).unwrap();
    let second = manager.rollback(&report.audit_id, "second", true);
    assert!(matches!(
        second,
        Err(DistillError::Rollback(RollbackError::AlreadyRolledBack { .. }))
    ));
}

#[test]
fn rollback_without_confirmation_is_refused() {
    let (store, orchestrator) = setup();
    store.insert_raw_entities(&[make_pain("pp-1", "i1")]).unwrap();
    let report = orchestrator.run(None, false).unwrap();

    let manager = RollbackManager::new(Arc::clone(&store));
    let result = manager.rollback(&report.audit_id, "no confirm", false);
    assert!(matches!(
        result,
        Err(DistillError::Rollback(RollbackError::ConfirmationRequired { .. }))
    ));
    // And nothing happened.
    assert_eq!(store.consolidated_for_run(&report.audit_id).unwrap().len(), 1);
}

#[test]
fn rolled_back_entities_can_be_consolidated_again() {
    let (store, orchestrator) = setup();
    store
        .insert_raw_entities(&[make_pain("pp-1", "i1"), make_pain("pp-2", "i2")])
        .unwrap();
    let first = orchestrator.run(None, false).unwrap();

    RollbackManager::new(Arc::clone(&store))
        .rollback(&first.audit_id, "redo", true)
        .unwrap();

    let second = orchestrator.run(None, false).unwrap();
    assert_eq!(second.metrics.entities_merged, 1);
    assert_eq!(store.consolidated_for_run(&second.audit_id).unwrap().len(), 1);
}
