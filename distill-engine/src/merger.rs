//! EntityMerger — builds one consolidated entity per cluster and persists it
//! through the store's atomic snapshot-then-write transaction.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use distill_core::entity::{ConsolidatedEntity, EntityType, TypedAttributes};
use distill_core::errors::{DistillError, DistillResult};
use distill_core::models::DuplicateCluster;
use distill_core::traits::EntityStore;

use crate::consensus::ConsensusResult;

pub struct EntityMerger {
    store: Arc<dyn EntityStore>,
}

impl EntityMerger {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Construct the consolidated entity for a cluster. Pure: no writes.
    pub fn build(
        &self,
        audit_id: &str,
        cluster: &DuplicateCluster,
        consensus: &ConsensusResult,
    ) -> ConsolidatedEntity {
        let primary = cluster.primary();
        let mentioned_in_interviews: BTreeSet<String> = cluster.interview_ids();

        ConsolidatedEntity {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type: cluster.entity_type,
            org_id: primary.org_id.clone(),
            name: primary.name.clone(),
            description: canonical_description(cluster),
            attributes: primary.attributes.clone(),
            source_count: mentioned_in_interviews.len(),
            mentioned_in_interviews,
            consensus_confidence: consensus.confidence,
            contradiction_flag: consensus.contradiction,
            contradicting_sources: consensus.contradicting_sources.clone(),
            audit_id: audit_id.to_string(),
            consolidated_at: Utc::now(),
        }
    }

    /// Persist the merge atomically: member snapshots, the consolidated row,
    /// and the absorbed markers in one transaction. A failed commit is
    /// retried once; the second failure propagates and fails the run.
    pub fn persist(
        &self,
        audit_id: &str,
        cluster: &DuplicateCluster,
        consolidated: &ConsolidatedEntity,
    ) -> DistillResult<()> {
        match self
            .store
            .commit_merge(audit_id, &cluster.members, consolidated)
        {
            Ok(()) => {}
            Err(DistillError::Storage(e)) => {
                warn!(
                    consolidated_id = %consolidated.id,
                    error = %e,
                    "merge transaction failed, retrying once"
                );
                self.store
                    .commit_merge(audit_id, &cluster.members, consolidated)?;
            }
            Err(e) => return Err(e),
        }

        info!(
            consolidated_id = %consolidated.id,
            entity_type = %consolidated.entity_type,
            sources = consolidated.source_count,
            confidence = %consolidated.consensus_confidence,
            "cluster merged"
        );
        Ok(())
    }
}

/// Per-type canonical description strategy. The transactional mechanism is
/// uniform; only the text selection varies by type.
fn canonical_description(cluster: &DuplicateCluster) -> String {
    let primary = cluster.primary();
    match cluster.entity_type {
        // Most detailed mention wins.
        EntityType::PainPoint
        | EntityType::Process
        | EntityType::AutomationCandidate
        | EntityType::TeamStructure => cluster
            .members
            .iter()
            .max_by_key(|m| m.description.len())
            .map(|m| m.description.clone())
            .unwrap_or_else(|| primary.description.clone()),
        // Distinct reported targets are all kept.
        EntityType::Kpi => {
            let mut description = cluster
                .members
                .iter()
                .max_by_key(|m| m.description.len())
                .map(|m| m.description.clone())
                .unwrap_or_default();
            let mut targets: Vec<String> = Vec::new();
            for member in &cluster.members {
                if let TypedAttributes::Kpi(attrs) = &member.attributes {
                    if let Some(target) = attrs.target {
                        let formatted = match &attrs.unit {
                            Some(unit) => format!("{target} {unit}"),
                            None => target.to_string(),
                        };
                        if !targets.contains(&formatted) {
                            targets.push(formatted);
                        }
                    }
                }
            }
            if targets.len() > 1 {
                description.push_str(&format!("; reported targets: {}", targets.join(", ")));
            }
            description
        }
        // Longest description plus any distinct category notes.
        EntityType::System => {
            let mut description = cluster
                .members
                .iter()
                .max_by_key(|m| m.description.len())
                .map(|m| m.description.clone())
                .unwrap_or_default();
            let mut categories: Vec<String> = Vec::new();
            for member in &cluster.members {
                if let TypedAttributes::System(attrs) = &member.attributes {
                    if let Some(category) = &attrs.category {
                        if !categories.contains(category) {
                            categories.push(category.clone());
                        }
                    }
                }
            }
            if categories.len() > 1 {
                description.push_str(&format!(" (categories: {})", categories.join(", ")));
            }
            description
        }
    }
}
