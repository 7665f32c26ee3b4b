//! PatternRecognizer — read-only scan of the consolidated set for recurring
//! issues and problematic resources.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use distill_core::config::PatternConfig;
use distill_core::entity::{ConsolidatedEntity, EntityType, Sentiment};
use distill_core::models::{Pattern, PatternType, Relationship, RelationshipType};

pub struct PatternRecognizer {
    config: PatternConfig,
}

impl PatternRecognizer {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Scan the consolidated set. Reads entities and discovered edges only;
    /// never mutates either.
    pub fn recognize(
        &self,
        entities: &[ConsolidatedEntity],
        relationships: &[Relationship],
        audit_id: &str,
    ) -> Vec<Pattern> {
        let mut patterns = Vec::new();

        let mut by_org: BTreeMap<&str, Vec<&ConsolidatedEntity>> = BTreeMap::new();
        for entity in entities {
            by_org.entry(entity.org_id.as_str()).or_default().push(entity);
        }

        for (org_id, group) in &by_org {
            // Corpus size for share computations: distinct interviews across
            // the org's consolidated set.
            let corpus_interviews: BTreeSet<&str> = group
                .iter()
                .flat_map(|e| e.mentioned_in_interviews.iter().map(|s| s.as_str()))
                .collect();
            let corpus_size = corpus_interviews.len().max(1);

            patterns.extend(self.recurring_issues(org_id, group, corpus_size, audit_id));
            patterns.extend(self.problematic_resources(
                org_id,
                group,
                relationships,
                audit_id,
            ));
        }

        patterns.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(patterns = patterns.len(), "pattern recognition complete");
        patterns
    }

    /// Any entity whose source_count reaches the recurring floor.
    fn recurring_issues(
        &self,
        org_id: &str,
        group: &[&ConsolidatedEntity],
        corpus_size: usize,
        audit_id: &str,
    ) -> Vec<Pattern> {
        group
            .iter()
            .filter(|e| e.source_count >= self.config.recurring_floor)
            .map(|entity| {
                let share = entity.source_count as f64 / corpus_size as f64;
                Pattern {
                    id: pattern_id("recurring", &entity.id),
                    pattern_type: PatternType::RecurringIssue,
                    name: format!("recurring {}: {}", entity.entity_type, entity.name),
                    org_id: org_id.to_string(),
                    supporting_entity_ids: vec![entity.id.clone()],
                    frequency: entity.source_count,
                    strength: share.min(1.0),
                    high_priority: share >= self.config.high_priority_share,
                    audit_id: audit_id.to_string(),
                }
            })
            .collect()
    }

    /// Any system causally linked to enough distinct negative pain points.
    fn problematic_resources(
        &self,
        org_id: &str,
        group: &[&ConsolidatedEntity],
        relationships: &[Relationship],
        audit_id: &str,
    ) -> Vec<Pattern> {
        let entity_index: BTreeMap<&str, &ConsolidatedEntity> =
            group.iter().map(|e| (e.id.as_str(), *e)).collect();
        let negative_pains: BTreeSet<&str> = group
            .iter()
            .filter(|e| {
                e.entity_type == EntityType::PainPoint
                    && e.attributes.sentiment() != Some(Sentiment::Positive)
            })
            .map(|e| e.id.as_str())
            .collect();
        let pain_count = group
            .iter()
            .filter(|e| e.entity_type == EntityType::PainPoint)
            .count()
            .max(1);

        let mut patterns = Vec::new();
        for system in group
            .iter()
            .filter(|e| e.entity_type == EntityType::System)
        {
            let linked_pains: BTreeSet<&str> = relationships
                .iter()
                .filter(|r| {
                    r.relationship_type == RelationshipType::Causes
                        && r.source_id == system.id
                        && negative_pains.contains(r.target_id.as_str())
                        // Only edges whose endpoints resolve inside this org.
                        && entity_index.contains_key(r.target_id.as_str())
                })
                .map(|r| r.target_id.as_str())
                .collect();

            if linked_pains.len() >= self.config.problematic_link_floor {
                let share = linked_pains.len() as f64 / pain_count as f64;
                let mut supporting: Vec<String> = vec![system.id.clone()];
                supporting.extend(linked_pains.iter().map(|s| s.to_string()));
                patterns.push(Pattern {
                    id: pattern_id("problematic", &system.id),
                    pattern_type: PatternType::ProblematicResource,
                    name: format!("problematic system: {}", system.name),
                    org_id: org_id.to_string(),
                    supporting_entity_ids: supporting,
                    frequency: linked_pains.len(),
                    strength: share.min(1.0),
                    high_priority: share >= self.config.high_priority_share,
                    audit_id: audit_id.to_string(),
                });
            }
        }
        patterns
    }
}

/// Deterministic pattern id, stable across re-runs on the same set.
fn pattern_id(kind: &str, entity_id: &str) -> String {
    blake3::hash(format!("{kind}|{entity_id}").as_bytes())
        .to_hex()
        .to_string()
}
