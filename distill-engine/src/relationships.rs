//! RelationshipDiscoverer — fixed, independent, additive rules over the
//! consolidated set. Deterministic and idempotent; never crosses org_id.

use std::collections::BTreeMap;

use tracing::debug;

use distill_core::entity::{ConsolidatedEntity, EntityType, Sentiment, TypedAttributes};
use distill_core::models::{InferenceRule, Relationship, RelationshipType};
use distill_embeddings::normalize::normalize;

use crate::similarity::{keyword_overlap, salient_keywords};

/// Confidence by match strength.
const CONFIDENCE_EXPLICIT: f64 = 0.90;
const CONFIDENCE_NAME_MENTION: f64 = 0.75;
/// Keyword overlap below this is noise, not a relationship.
const KEYWORD_OVERLAP_FLOOR: f64 = 0.20;

pub struct RelationshipDiscoverer;

impl RelationshipDiscoverer {
    /// Apply every rule to the full consolidated set. Re-running on the same
    /// set reproduces the same edges (deterministic ids, sorted output).
    pub fn discover(entities: &[ConsolidatedEntity], audit_id: &str) -> Vec<Relationship> {
        let mut by_org: BTreeMap<&str, Vec<&ConsolidatedEntity>> = BTreeMap::new();
        for entity in entities {
            by_org.entry(entity.org_id.as_str()).or_default().push(entity);
        }

        // Keep the strongest edge per (source, target, type).
        let mut edges: BTreeMap<String, Relationship> = BTreeMap::new();
        for group in by_org.values() {
            for edge in discover_in_org(group, audit_id) {
                edges
                    .entry(edge.id.clone())
                    .and_modify(|existing| {
                        if edge.confidence > existing.confidence {
                            *existing = edge.clone();
                        }
                    })
                    .or_insert(edge);
            }
        }

        let result: Vec<Relationship> = edges.into_values().collect();
        debug!(edges = result.len(), "relationship discovery complete");
        result
    }
}

/// All rules within one org. Namespace isolation holds by construction:
/// pairs are only ever drawn from the same group.
fn discover_in_org(group: &[&ConsolidatedEntity], audit_id: &str) -> Vec<Relationship> {
    let of_type = |t: EntityType| -> Vec<&ConsolidatedEntity> {
        group
            .iter()
            .copied()
            .filter(|e| e.entity_type == t)
            .collect()
    };
    let processes = of_type(EntityType::Process);
    let systems = of_type(EntityType::System);
    let pains = of_type(EntityType::PainPoint);
    let kpis = of_type(EntityType::Kpi);
    let candidates = of_type(EntityType::AutomationCandidate);

    let mut edges = Vec::new();

    // USES: a process runs on a system.
    for &process in &processes {
        for &system in &systems {
            if let TypedAttributes::Process(attrs) = &process.attributes {
                if attrs
                    .systems_involved
                    .iter()
                    .any(|s| names_match(s, system))
                {
                    edges.push(make_edge(
                        process,
                        system,
                        RelationshipType::Uses,
                        CONFIDENCE_EXPLICIT,
                        InferenceRule::ExplicitAttribute,
                        vec![format!("systems_involved names '{}'", system.name)],
                        audit_id,
                    ));
                    continue;
                }
            }
            if mentions(&process.description, &system.name) {
                edges.push(make_edge(
                    process,
                    system,
                    RelationshipType::Uses,
                    CONFIDENCE_NAME_MENTION,
                    InferenceRule::NameMention,
                    vec![format!("description mentions '{}'", system.name)],
                    audit_id,
                ));
            }
        }
    }

    // CAUSES: a system implicated in a pain point.
    for &system in &systems {
        for &pain in &pains {
            if mentions(&pain.match_description(), &system.name) {
                edges.push(make_edge(
                    system,
                    pain,
                    RelationshipType::Causes,
                    CONFIDENCE_NAME_MENTION,
                    InferenceRule::NameMention,
                    vec![format!("pain point mentions '{}'", system.name)],
                    audit_id,
                ));
                continue;
            }
            if pain.attributes.sentiment() == Some(Sentiment::Positive) {
                continue;
            }
            let system_keywords = salient_keywords(&system.description);
            let pain_keywords = salient_keywords(&pain.description);
            let overlap = keyword_overlap(&system_keywords, &pain_keywords);
            if overlap >= KEYWORD_OVERLAP_FLOOR {
                let shared: Vec<String> = system_keywords
                    .intersection(&pain_keywords)
                    .cloned()
                    .collect();
                edges.push(make_edge(
                    system,
                    pain,
                    RelationshipType::Causes,
                    (0.5 + overlap / 2.0).min(0.85),
                    InferenceRule::KeywordOverlap,
                    vec![format!("shared keywords: {}", sorted_csv(shared))],
                    audit_id,
                ));
            }
        }
    }

    // MEASURES: a KPI measures a process.
    for &kpi in &kpis {
        for &process in &processes {
            if let TypedAttributes::Kpi(attrs) = &kpi.attributes {
                if attrs
                    .measures_process
                    .as_deref()
                    .is_some_and(|reference| names_match(reference, process))
                {
                    edges.push(make_edge(
                        kpi,
                        process,
                        RelationshipType::Measures,
                        CONFIDENCE_EXPLICIT,
                        InferenceRule::ExplicitAttribute,
                        vec![format!("measures_process names '{}'", process.name)],
                        audit_id,
                    ));
                    continue;
                }
            }
            if mentions(&kpi.description, &process.name) {
                edges.push(make_edge(
                    kpi,
                    process,
                    RelationshipType::Measures,
                    CONFIDENCE_NAME_MENTION,
                    InferenceRule::NameMention,
                    vec![format!("description mentions '{}'", process.name)],
                    audit_id,
                ));
            }
        }
    }

    // ADDRESSES: automation candidates and systems against pain points.
    for &candidate in &candidates {
        for &pain in &pains {
            if let TypedAttributes::AutomationCandidate(attrs) = &candidate.attributes {
                if attrs
                    .addresses_pain_point
                    .as_deref()
                    .is_some_and(|reference| names_match(reference, pain))
                {
                    edges.push(make_edge(
                        candidate,
                        pain,
                        RelationshipType::Addresses,
                        CONFIDENCE_EXPLICIT,
                        InferenceRule::ExplicitAttribute,
                        vec![format!("addresses_pain_point names '{}'", pain.name)],
                        audit_id,
                    ));
                    continue;
                }
            }
            if mentions(&candidate.description, &pain.name) {
                edges.push(make_edge(
                    candidate,
                    pain,
                    RelationshipType::Addresses,
                    CONFIDENCE_NAME_MENTION,
                    InferenceRule::NameMention,
                    vec![format!("description mentions '{}'", pain.name)],
                    audit_id,
                ));
            }
        }
    }
    for &system in &systems {
        for &pain in &pains {
            if let TypedAttributes::System(attrs) = &system.attributes {
                if attrs
                    .pain_points_addressed
                    .iter()
                    .any(|reference| names_match(reference, pain))
                {
                    edges.push(make_edge(
                        system,
                        pain,
                        RelationshipType::Addresses,
                        CONFIDENCE_EXPLICIT,
                        InferenceRule::ExplicitAttribute,
                        vec![format!("pain_points_addressed names '{}'", pain.name)],
                        audit_id,
                    ));
                }
            }
        }
    }

    edges
}

fn make_edge(
    source: &ConsolidatedEntity,
    target: &ConsolidatedEntity,
    relationship_type: RelationshipType,
    confidence: f64,
    rule: InferenceRule,
    evidence: Vec<String>,
    audit_id: &str,
) -> Relationship {
    Relationship {
        id: Relationship::edge_id(&source.id, &target.id, relationship_type),
        source_id: source.id.clone(),
        target_id: target.id.clone(),
        relationship_type,
        confidence,
        rule,
        evidence,
        audit_id: audit_id.to_string(),
    }
}

/// A foreign-key-like reference matches an entity by id or normalized name.
fn names_match(reference: &str, entity: &ConsolidatedEntity) -> bool {
    reference == entity.id || normalize(reference) == normalize(&entity.name)
}

/// Whole-text containment over normalized text; references shorter than 3
/// characters match too much to be meaningful.
fn mentions(text: &str, name: &str) -> bool {
    let needle = normalize(name);
    if needle.chars().count() < 3 {
        return false;
    }
    normalize(text).contains(&needle)
}

fn sorted_csv(mut items: Vec<String>) -> String {
    items.sort();
    items.join(", ")
}

trait MatchText {
    fn match_description(&self) -> String;
}

impl MatchText for ConsolidatedEntity {
    fn match_description(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}
