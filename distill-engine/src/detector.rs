//! DuplicateDetector — partitions same-type raw entities into disjoint
//! clusters via fuzzy-first two-stage matching and union-find closure.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use tracing::debug;

use distill_core::config::detection::{DetectionConfig, TypeThresholds};
use distill_core::entity::{EntityType, RawEntity};
use distill_core::errors::DistillResult;
use distill_core::models::{DuplicateCluster, PairDecision, PairScore, SkippedItem};
use distill_embeddings::normalize::normalize;

use crate::matcher::SimilarityMatcher;

/// The detector's output for one entity type.
#[derive(Debug)]
pub struct DetectionOutcome {
    /// Disjoint clusters ordered by descending size, then primary id.
    pub clusters: Vec<DuplicateCluster>,
    /// Malformed entities excluded from clustering, with reasons.
    pub skipped: Vec<SkippedItem>,
    /// Pairs decided without an embedding call.
    pub saved_embedding_calls: usize,
    /// True when any pair had to fall back to lexical-only decisioning.
    pub degraded: bool,
}

/// One judged candidate pair.
struct PairVerdict {
    i: usize,
    j: usize,
    score: PairScore,
    duplicate: bool,
    saved_call: bool,
    degraded: bool,
}

pub struct DuplicateDetector {
    matcher: Arc<SimilarityMatcher>,
    config: DetectionConfig,
}

impl DuplicateDetector {
    pub fn new(matcher: Arc<SimilarityMatcher>, config: DetectionConfig) -> Self {
        Self { matcher, config }
    }

    /// Partition `entities` into disjoint duplicate clusters. Singletons are
    /// clusters of one. Every valid input lands in exactly one cluster.
    pub fn detect(
        &self,
        entity_type: EntityType,
        entities: Vec<RawEntity>,
    ) -> DistillResult<DetectionOutcome> {
        let thresholds = self.config.thresholds_for(entity_type)?;

        let mut valid = Vec::new();
        let mut skipped = Vec::new();
        for entity in entities {
            match entity.validate() {
                Ok(()) => valid.push(entity),
                Err(e) => {
                    tracing::warn!(entity_id = %entity.id, error = %e, "entity excluded from clustering");
                    skipped.push(SkippedItem {
                        entity_id: entity.id.clone(),
                        entity_type,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if valid.is_empty() {
            return Ok(DetectionOutcome {
                clusters: vec![],
                skipped,
                saved_embedding_calls: 0,
                degraded: false,
            });
        }

        let pairs = self.candidate_pairs(&valid);
        let verdicts: Vec<PairVerdict> = pairs
            .par_iter()
            .map(|&(i, j)| self.judge_pair(thresholds, &valid, i, j))
            .collect();

        let saved_embedding_calls = verdicts.iter().filter(|v| v.saved_call).count();
        let degraded = verdicts.iter().any(|v| v.degraded);

        // Transitive closure: if A~B and B~C then A/B/C are one cluster.
        let mut union_find: UnionFind<usize> = UnionFind::new(valid.len());
        for verdict in verdicts.iter().filter(|v| v.duplicate) {
            union_find.union(verdict.i, verdict.j);
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for idx in 0..valid.len() {
            groups.entry(union_find.find(idx)).or_default().push(idx);
        }

        let mut clusters = Vec::with_capacity(groups.len());
        for (root, member_indices) in groups {
            let members: Vec<RawEntity> =
                member_indices.iter().map(|&i| valid[i].clone()).collect();
            let primary_id = pick_primary(&members);
            let member_ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
            let pairs: Vec<PairScore> = verdicts
                .iter()
                .filter(|v| {
                    v.duplicate
                        && union_find.find(v.i) == root
                        && member_ids.contains(&v.score.a.as_str())
                })
                .map(|v| v.score.clone())
                .collect();
            clusters.push(DuplicateCluster {
                entity_type,
                members,
                primary_id,
                pairs,
            });
        }

        // Largest clusters first; primary id breaks ties for reproducibility.
        clusters.sort_by(|a, b| {
            Reverse(a.size())
                .cmp(&Reverse(b.size()))
                .then_with(|| a.primary_id.cmp(&b.primary_id))
        });

        debug!(
            entity_type = %entity_type,
            inputs = valid.len(),
            clusters = clusters.len(),
            saved = saved_embedding_calls,
            "duplicate detection complete"
        );

        Ok(DetectionOutcome {
            clusters,
            skipped,
            saved_embedding_calls,
            degraded,
        })
    }

    /// Bounded candidate window: entities sorted by (normalized name, id),
    /// each compared against at most `max_candidates` successors. Pairs
    /// never cross org boundaries.
    fn candidate_pairs(&self, valid: &[RawEntity]) -> Vec<(usize, usize)> {
        let mut by_org: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, entity) in valid.iter().enumerate() {
            by_org.entry(entity.org_id.as_str()).or_default().push(idx);
        }

        let mut pairs = Vec::new();
        for indices in by_org.values_mut() {
            indices.sort_by(|&a, &b| {
                let key_a = (normalize(&valid[a].name), &valid[a].id);
                let key_b = (normalize(&valid[b].name), &valid[b].id);
                key_a.cmp(&key_b)
            });
            for (pos, &i) in indices.iter().enumerate() {
                for &j in indices.iter().skip(pos + 1).take(self.config.max_candidates) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Two-stage verdict for one pair:
    /// 1. lexical >= skip threshold: duplicate, no embedding call;
    /// 2. lexical < the type's floor: reject, no embedding call;
    /// 3. otherwise semantic decides; when unavailable the pair degrades to
    ///    lexical-only against the type's semantic threshold.
    fn judge_pair(
        &self,
        thresholds: TypeThresholds,
        valid: &[RawEntity],
        i: usize,
        j: usize,
    ) -> PairVerdict {
        let (a, b) = (&valid[i], &valid[j]);
        let text_a = a.match_text();
        let text_b = b.match_text();
        let lexical = self.matcher.lexical(&text_a, &text_b);

        if lexical >= self.config.skip_semantic_threshold {
            return PairVerdict {
                i,
                j,
                score: PairScore {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    lexical,
                    semantic: None,
                    decided_by: PairDecision::LexicalShortCircuit,
                },
                duplicate: true,
                saved_call: true,
                degraded: false,
            };
        }

        if lexical < thresholds.lexical_floor {
            return PairVerdict {
                i,
                j,
                score: PairScore {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    lexical,
                    semantic: None,
                    decided_by: PairDecision::LexicalShortCircuit,
                },
                duplicate: false,
                saved_call: true,
                degraded: false,
            };
        }

        match self.matcher.semantic(&text_a, &text_b) {
            Some(semantic) => PairVerdict {
                i,
                j,
                score: PairScore {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    lexical,
                    semantic: Some(semantic),
                    decided_by: PairDecision::Semantic,
                },
                duplicate: semantic >= thresholds.semantic_threshold,
                saved_call: false,
                degraded: false,
            },
            None => PairVerdict {
                i,
                j,
                score: PairScore {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    lexical,
                    semantic: None,
                    decided_by: PairDecision::LexicalFallback,
                },
                duplicate: lexical >= thresholds.semantic_threshold,
                saved_call: false,
                degraded: true,
            },
        }
    }
}

/// Highest-information member: longest description, ties broken by lowest
/// (source_interview_id, id) so re-runs pick the same primary.
fn pick_primary(members: &[RawEntity]) -> String {
    members
        .iter()
        .max_by(|a, b| {
            a.description
                .len()
                .cmp(&b.description.len())
                .then_with(|| {
                    // Reversed: the *lowest* source/id wins the tie.
                    (b.source_interview_id.as_str(), b.id.as_str())
                        .cmp(&(a.source_interview_id.as_str(), a.id.as_str()))
                })
        })
        .map(|m| m.id.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use distill_core::config::EmbeddingConfig;
    use distill_core::entity::TypedAttributes;
    use distill_core::errors::DistillResult;
    use distill_core::traits::EmbeddingProvider;
    use distill_embeddings::EmbeddingEngine;

    /// One-hot topic embeddings: texts sharing a topic keyword are
    /// semantically identical, others orthogonal. Keeps pair verdicts
    /// independent of any real embedding model.
    struct TopicProvider;

    const TOPICS: &[&str] = &["invoic", "sap", "morale", "onboard", "topic"];

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

    fn make_entity(id: &str, name: &str, description: &str) -> RawEntity {
        RawEntity {
            id: id.to_string(),
            entity_type: EntityType::PainPoint,
            org_id: "org-a".to_string(),
            source_interview_id: format!("int-{id}"),
            name: name.to_string(),
            description: description.to_string(),
            attributes: TypedAttributes::empty(EntityType::PainPoint),
            extracted_at: Utc::now(),
        }
    }

    fn make_detector() -> DuplicateDetector {
        let engine = Arc::new(EmbeddingEngine::new(
            Box::new(TopicProvider),
            &EmbeddingConfig::default(),
        ));
        DuplicateDetector::new(
            Arc::new(SimilarityMatcher::new(engine)),
            DetectionConfig::default(),
        )
    }

    #[test]
    fn near_identical_mentions_cluster_without_embeddings() {
        let detector = make_detector();
        let entities = vec![
            make_entity("a", "late invoicing", "invoices go out late"),
            make_entity("b", "late invoicing", "invoices go out late"),
            make_entity("c", "sap outage", "sap keeps crashing in the mornings"),
        ];
        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        assert_eq!(outcome.clusters.len(), 2);
        assert_eq!(outcome.clusters[0].size(), 2);
        assert!(outcome.saved_embedding_calls > 0);
    }

    #[test]
    fn every_entity_lands_in_exactly_one_cluster() {
        let detector = make_detector();
        let entities: Vec<RawEntity> = (0..8)
            .map(|i| make_entity(&format!("e{i}"), &format!("topic {i}"), "distinct text"))
            .collect();
        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        let total: usize = outcome.clusters.iter().map(|c| c.size()).sum();
        assert_eq!(total, 8);
        let mut seen = std::collections::HashSet::new();
        for cluster in &outcome.clusters {
            for member in &cluster.members {
                assert!(seen.insert(member.id.clone()), "{} appears twice", member.id);
            }
        }
    }

    #[test]
    fn detection_is_idempotent() {
        let detector = make_detector();
        let entities = vec![
            make_entity("a", "late invoicing", "invoices go out late"),
            make_entity("b", "invoicing late", "invoices late again"),
            make_entity("c", "sap outage", "sap down"),
            make_entity("d", "team morale", "people unhappy"),
        ];
        let first = detector.detect(EntityType::PainPoint, entities.clone()).unwrap();
        let second = detector.detect(EntityType::PainPoint, entities).unwrap();
        let shape = |outcome: &DetectionOutcome| {
            outcome
                .clusters
                .iter()
                .map(|c| {
                    let mut ids: Vec<String> =
                        c.members.iter().map(|m| m.id.clone()).collect();
                    ids.sort();
                    (ids, c.primary_id.clone())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn malformed_entities_are_skipped_with_reason() {
        let detector = make_detector();
        let mut bad = make_entity("bad", "x", "y");
        bad.org_id = String::new();
        let entities = vec![make_entity("good", "late invoicing", "late"), bad];
        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].entity_id, "bad");
        let total: usize = outcome.clusters.iter().map(|c| c.size()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn entities_from_different_orgs_never_cluster() {
        let detector = make_detector();
        let mut other_org = make_entity("b", "late invoicing", "invoices go out late");
        other_org.org_id = "org-b".to_string();
        let entities = vec![
            make_entity("a", "late invoicing", "invoices go out late"),
            other_org,
        ];
        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        assert_eq!(outcome.clusters.len(), 2);
    }

    #[test]
    fn primary_is_the_most_detailed_member() {
        let detector = make_detector();
        let entities = vec![
            make_entity("a", "late invoicing", "late"),
            make_entity(
                "b",
                "late invoicing",
                "invoices chronically go out three weeks late",
            ),
        ];
        let outcome = detector.detect(EntityType::PainPoint, entities).unwrap();
        let cluster = outcome
            .clusters
            .iter()
            .find(|c| c.size() == 2)
            .expect("pair should merge");
        assert_eq!(cluster.primary_id, "b");
    }
}
