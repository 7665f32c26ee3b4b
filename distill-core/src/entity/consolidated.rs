use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attributes::TypedAttributes;
use super::confidence::Confidence;
use super::entity_type::EntityType;

/// The output of merging a duplicate cluster. Never mutated in place after
/// creation within a run — a correction requires rollback + re-merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedEntity {
    /// Stable uuid v4 identifier.
    pub id: String,
    pub entity_type: EntityType,
    pub org_id: String,
    /// Canonical name, taken from the cluster's primary member.
    pub name: String,
    /// Canonical description, per-type merge strategy.
    pub description: String,
    /// Canonical attributes, taken from the primary member. Relationship
    /// discovery reads explicit cross-references out of these.
    pub attributes: TypedAttributes,
    /// Number of raw mentions merged in. Always equals
    /// `mentioned_in_interviews.len()` and is at least 1.
    pub source_count: usize,
    /// Interviews that mentioned this entity. Ordered set for determinism.
    pub mentioned_in_interviews: BTreeSet<String>,
    pub consensus_confidence: Confidence,
    pub contradiction_flag: bool,
    /// Source interview ids whose attribute values conflict.
    pub contradicting_sources: Vec<String>,
    /// The consolidation run that produced this entity.
    pub audit_id: String,
    pub consolidated_at: DateTime<Utc>,
}

impl ConsolidatedEntity {
    /// Source accounting invariant: `source_count == |mentioned_in_interviews|`
    /// and `source_count >= 1`.
    pub fn source_accounting_ok(&self) -> bool {
        self.source_count == self.mentioned_in_interviews.len() && self.source_count >= 1
    }
}

/// Identity equality by id, as with raw entities.
impl PartialEq for ConsolidatedEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_consolidated(interviews: &[&str], source_count: usize) -> ConsolidatedEntity {
        ConsolidatedEntity {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type: EntityType::PainPoint,
            org_id: "org-a".to_string(),
            name: "late invoicing".to_string(),
            description: "invoices chronically late".to_string(),
            attributes: TypedAttributes::empty(EntityType::PainPoint),
            source_count,
            mentioned_in_interviews: interviews.iter().map(|s| s.to_string()).collect(),
            consensus_confidence: Confidence::new(0.8),
            contradiction_flag: false,
            contradicting_sources: vec![],
            audit_id: "audit-1".to_string(),
            consolidated_at: Utc::now(),
        }
    }

    #[test]
    fn matching_counts_pass_accounting() {
        assert!(make_consolidated(&["i1", "i2"], 2).source_accounting_ok());
    }

    #[test]
    fn mismatched_counts_fail_accounting() {
        assert!(!make_consolidated(&["i1", "i2"], 3).source_accounting_ok());
    }

    #[test]
    fn zero_sources_fail_accounting() {
        assert!(!make_consolidated(&[], 0).source_accounting_ok());
    }
}
