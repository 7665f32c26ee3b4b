use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityType, RawEntity};

/// How a pairwise duplicate verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairDecision {
    /// Lexical similarity alone was high enough to skip the embedding call.
    LexicalShortCircuit,
    /// Semantic similarity decided against the type's threshold.
    Semantic,
    /// Embeddings were unavailable; lexical-only fallback decided.
    LexicalFallback,
}

/// Similarity evidence for one compared pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairScore {
    pub a: String,
    pub b: String,
    pub lexical: f64,
    /// None when the embedding provider was unavailable for this pair.
    pub semantic: Option<f64>,
    pub decided_by: PairDecision,
}

/// A set of same-type raw entities judged to denote one real-world object.
/// Transient — exists only during one consolidation run.
#[derive(Debug, Clone)]
pub struct DuplicateCluster {
    pub entity_type: EntityType,
    /// Cluster members. The primary is guaranteed to be among them.
    pub members: Vec<RawEntity>,
    /// Id of the highest-information member; canonical fields come from it.
    pub primary_id: String,
    /// Pairwise evidence for the duplicate edges inside this cluster.
    pub pairs: Vec<PairScore>,
}

impl DuplicateCluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn primary(&self) -> &RawEntity {
        self.members
            .iter()
            .find(|m| m.id == self.primary_id)
            .unwrap_or(&self.members[0])
    }

    /// Distinct source interviews across the cluster.
    pub fn interview_ids(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .map(|m| m.source_interview_id.clone())
            .collect()
    }
}
