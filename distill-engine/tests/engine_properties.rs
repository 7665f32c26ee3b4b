//! Property tests: detection coverage and idempotence, confidence bounds.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;

use distill_core::config::{ConsensusConfig, DetectionConfig, EmbeddingConfig};
use distill_core::entity::{EntityType, RawEntity, TypedAttributes};
use distill_core::models::DuplicateCluster;
use distill_embeddings::{EmbeddingEngine, HashedProvider};
use distill_engine::consensus::ConsensusScorer;
use distill_engine::detector::DuplicateDetector;
use distill_engine::matcher::SimilarityMatcher;

fn make_entity(id: usize, name: &str) -> RawEntity {
    RawEntity {
        id: format!("e{id}"),
        entity_type: EntityType::PainPoint,
        org_id: "org-a".to_string(),
        source_interview_id: format!("i{id}"),
        name: name.to_string(),
        description: format!("{name} description"),
        attributes: TypedAttributes::empty(EntityType::PainPoint),
        extracted_at: Utc::now(),
    }
}

fn make_detector() -> DuplicateDetector {
    let engine = Arc::new(EmbeddingEngine::new(
        Box::new(HashedProvider::default()),
        &EmbeddingConfig::default(),
    ));
    DuplicateDetector::new(
        Arc::new(SimilarityMatcher::new(engine)),
        DetectionConfig::default(),
    )
}

fn cluster_shape(clusters: &[DuplicateCluster]) -> Vec<(Vec<String>, String)> {
    clusters
        .iter()
        .map(|c| {
            let mut ids: Vec<String> = c.members.iter().map(|m| m.id.clone()).collect();
            ids.sort();
            (ids, c.primary_id.clone())
        })
        .collect()
}

proptest! {
    /// Every valid input lands in exactly one cluster, none dropped.
    #[test]
    fn cluster_coverage(names in prop::collection::vec("[a-z]{3,12}( [a-z]{3,12}){0,3}", 1..20)) {
        let detector = make_detector();
        let entities: Vec<RawEntity> = names
            .iter()
            .enumerate()
            .map(|(i, name)| make_entity(i, name))
            .collect();
        let count = entities.len();

        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        let total: usize = outcome.clusters.iter().map(|c| c.size()).sum();
        prop_assert_eq!(total + outcome.skipped.len(), count);

        let mut seen = std::collections::HashSet::new();
        for cluster in &outcome.clusters {
            for member in &cluster.members {
                prop_assert!(seen.insert(member.id.clone()));
            }
        }
    }

    /// Re-running detection yields the same partition and primaries.
    #[test]
    fn detection_idempotence(names in prop::collection::vec("[a-z]{3,10}", 1..12)) {
        let detector = make_detector();
        let entities: Vec<RawEntity> = names
            .iter()
            .enumerate()
            .map(|(i, name)| make_entity(i, name))
            .collect();

        let first = detector.detect(EntityType::PainPoint, entities.clone()).unwrap();
        let second = detector.detect(EntityType::PainPoint, entities).unwrap();
        prop_assert_eq!(cluster_shape(&first.clusters), cluster_shape(&second.clusters));
    }

    /// Consensus confidence stays in [0, 1] for any cluster size and any
    /// (valid) constants.
    #[test]
    fn confidence_bounds(
        size in 1usize..30,
        divisor in 0.5f64..50.0,
        penalty in 0.0f64..1.0,
        bonus in 0.0f64..1.0,
    ) {
        let scorer = ConsensusScorer::new(ConsensusConfig {
            divisor,
            single_source_penalty: penalty,
            contradiction_penalty: penalty,
            agreement_bonus: bonus,
        });
        let members: Vec<RawEntity> = (0..size)
            .map(|i| make_entity(i, "identical mention"))
            .collect();
        let cluster = DuplicateCluster {
            entity_type: EntityType::PainPoint,
            primary_id: members[0].id.clone(),
            members,
            pairs: vec![],
        };
        let result = scorer.score(&cluster);
        let v = result.confidence.value();
        prop_assert!((0.0..=1.0).contains(&v), "confidence {} out of bounds", v);
    }
}
