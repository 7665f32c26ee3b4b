//! End-to-end consolidation over a real in-memory store.

use std::sync::Arc;

use chrono::Utc;
use distill_core::config::{DistillConfig, EmbeddingConfig};
use distill_core::entity::attributes::{PainPointAttributes, SystemAttributes};
use distill_core::entity::{EntityType, RawEntity, Sentiment, TypedAttributes};
use distill_core::errors::DistillResult;
use distill_core::models::{RelationshipType, RunStatus};
use distill_core::traits::{EmbeddingProvider, EntityStore};
use distill_embeddings::EmbeddingEngine;
use distill_engine::ConsolidationOrchestrator;
use distill_storage::StorageEngine;

/// One-hot topic embeddings: texts sharing a topic keyword are semantically
/// identical, others orthogonal.
struct TopicProvider;

const TOPICS: &[&str] = &["sap", "invoic", "morale", "onboard"];

impl EmbeddingProvider for TopicProvider {
    fn embed(&self, text: &str) -> DistillResult<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector = vec![0.0f32; TOPICS.len() + 8];
        match TOPICS.iter().position(|t| lower.contains(t)) {
            Some(idx) => vector[idx] = 1.0,
            None => {
                let bucket = blake3::hash(lower.as_bytes()).as_bytes()[0] as usize % 8;
                vector[TOPICS.len() + bucket] = 1.0;
            }
        }
        Ok(vector)
    }
    fn embed_batch(&self, texts: &[String]) -> DistillResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
    fn dimensions(&self) -> usize {
        TOPICS.len() + 8
    }
    fn name(&self) -> &str {
        "topic-mock"
    }
    fn is_available(&self) -> bool {
        true
    }
}

fn make_pain(id: &str, interview: &str, name: &str, description: &str) -> RawEntity {
    RawEntity {
        id: id.to_string(),
        entity_type: EntityType::PainPoint,
        org_id: "org-a".to_string(),
        source_interview_id: interview.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        attributes: TypedAttributes::PainPoint(PainPointAttributes {
            sentiment: Some(Sentiment::Negative),
            ..Default::default()
        }),
        extracted_at: Utc::now(),
    }
}

fn make_system(id: &str, interview: &str) -> RawEntity {
    RawEntity {
        id: id.to_string(),
        entity_type: EntityType::System,
        org_id: "org-a".to_string(),
        source_interview_id: interview.to_string(),
        name: "SAP".to_string(),
        description: "erp platform for finance and logistics".to_string(),
        attributes: TypedAttributes::System(SystemAttributes::default()),
        extracted_at: Utc::now(),
    }
}

fn setup() -> (Arc<dyn EntityStore>, ConsolidationOrchestrator) {
    let store: Arc<dyn EntityStore> = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embeddings = Arc::new(EmbeddingEngine::new(
        Box::new(TopicProvider),
        &EmbeddingConfig::default(),
    ));
    let orchestrator = ConsolidationOrchestrator::new(
        Arc::clone(&store),
        embeddings,
        DistillConfig::default(),
    );
    (store, orchestrator)
}

/// Paraphrased mentions of one object, in different words and languages.
fn sap_pain_pair() -> Vec<RawEntity> {
    vec![
        make_pain("pp-1", "i1", "SAP outage", "SAP se cae seguido"),
        make_pain(
            "pp-2",
            "i2",
            "SAP outage problems",
            "el sistema SAP falla constantemente",
        ),
    ]
}

#[test]
fn paraphrased_pain_points_merge_into_one_entity() {
    let (store, orchestrator) = setup();
    let mut entities = sap_pain_pair();
    entities.push(make_pain(
        "pp-3",
        "i3",
        "low team morale",
        "people are unhappy with the tooling",
    ));
    store.insert_raw_entities(&entities).unwrap();

    let report = orchestrator.run(Some(vec![EntityType::PainPoint]), false).unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.metrics.entities_processed, 3);
    assert_eq!(report.metrics.entities_merged, 2);
    assert_eq!(report.metrics.duplicates_found, 1);

    let consolidated = store.all_consolidated().unwrap();
    let merged = consolidated.iter().find(|e| e.source_count == 2).unwrap();
    assert!(merged.mentioned_in_interviews.contains("i1"));
    assert!(merged.mentioned_in_interviews.contains("i2"));
    assert!(merged.source_accounting_ok());
}

#[test]
fn full_run_discovers_relationships_and_persists_audit() {
    let (store, orchestrator) = setup();
    let mut entities = sap_pain_pair();
    entities.push(make_system("sys-1", "i4"));
    store.insert_raw_entities(&entities).unwrap();

    let report = orchestrator.run(None, false).unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

    // The merged pain point names SAP, so discovery links the system to it.
    let relationships = store.relationships_for_run(&report.audit_id).unwrap();
    assert!(relationships
        .iter()
        .any(|r| r.relationship_type == RelationshipType::Causes));

    let record = store.get_audit(&report.audit_id).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.entities_merged, report.metrics.entities_merged);
}

#[test]
fn dry_run_writes_nothing() {
    let (store, orchestrator) = setup();
    store.insert_raw_entities(&sap_pain_pair()).unwrap();

    let report = orchestrator.run(None, true).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.metrics.entities_merged, 1);

    assert!(store.all_consolidated().unwrap().is_empty());
    assert!(store.list_audits().unwrap().is_empty());
    assert_eq!(
        store
            .load_unconsolidated(EntityType::PainPoint)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn second_run_over_consumed_input_is_clean() {
    let (store, orchestrator) = setup();
    store.insert_raw_entities(&sap_pain_pair()).unwrap();

    orchestrator.run(None, false).unwrap();
    let second = orchestrator.run(None, false).unwrap();

    // Nothing left to consolidate, and nothing anomalous about that.
    assert_eq!(second.status, RunStatus::Completed);
    assert_eq!(second.metrics.entities_processed, 0);
    assert!(!second.metrics.degraded);
}

#[test]
fn malformed_entities_are_reported_not_dropped() {
    let (store, orchestrator) = setup();
    let mut bad = make_pain("pp-bad", "i9", "x", "y");
    bad.name = String::new();
    let mut entities = sap_pain_pair();
    entities.push(bad);
    store.insert_raw_entities(&entities).unwrap();

    let report = orchestrator.run(None, false).unwrap();
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.metrics.skipped.len(), 1);
    assert_eq!(report.metrics.skipped[0].entity_id, "pp-bad");
}

#[test]
fn cancellation_before_the_first_batch_produces_a_cancelled_run() {
    let (store, orchestrator) = setup();
    store.insert_raw_entities(&sap_pain_pair()).unwrap();

    orchestrator
        .cancellation_token()
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let report = orchestrator.run(None, false).unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.metrics.entities_merged, 0);
    let record = store.get_audit(&report.audit_id).unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Cancelled);
}

#[test]
fn semantic_threshold_separates_aggressive_and_conservative_types() {
    // The same 0.8-similarity pair merges as a pain point (threshold 0.70)
    // but not as a team structure (threshold 0.90).
    struct GradedProvider;
    impl EmbeddingProvider for GradedProvider {
        fn embed(&self, text: &str) -> DistillResult<Vec<f32>> {
            // "alpha" and "beta" texts sit at cosine 0.8 to each other.
            if text.to_lowercase().contains("alpha") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.8, 0.6])
            }
        }
        fn embed_batch(&self, texts: &[String]) -> DistillResult<Vec<Vec<f32>>> {
            texts.iter().map(|t| self.embed(t)).collect()
        }
        fn dimensions(&self) -> usize {
            2
        }
        fn name(&self) -> &str {
            "graded-mock"
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    let run_for = |entity_type: EntityType| -> usize {
        let store: Arc<dyn EntityStore> = Arc::new(StorageEngine::open_in_memory().unwrap());
        let embeddings = Arc::new(EmbeddingEngine::new(
            Box::new(GradedProvider),
            &EmbeddingConfig::default(),
        ));
        let orchestrator = ConsolidationOrchestrator::new(
            Arc::clone(&store),
            embeddings,
            DistillConfig::default(),
        );
        let make = |id: &str, interview: &str, name: &str| RawEntity {
            id: id.to_string(),
            entity_type,
            org_id: "org-a".to_string(),
            source_interview_id: interview.to_string(),
            name: name.to_string(),
            description: "shared handoff process for orders".to_string(),
            attributes: TypedAttributes::empty(entity_type),
            extracted_at: Utc::now(),
        };
        store
            .insert_raw_entities(&[
                make("e1", "i1", "alpha handoff team"),
                make("e2", "i2", "beta handoff team"),
            ])
            .unwrap();
        let report = orchestrator.run(Some(vec![entity_type]), false).unwrap();
        report.metrics.entities_merged
    };

    // Merged: one consolidated entity. Not merged: two.
    assert_eq!(run_for(EntityType::PainPoint), 1);
    assert_eq!(run_for(EntityType::TeamStructure), 2);
}
