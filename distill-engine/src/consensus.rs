//! ConsensusScorer — confidence from corroboration, contradiction detection
//! per entity type. Flags conflicts for audit; never resolves them.

use std::collections::BTreeSet;

use distill_core::config::ConsensusConfig;
use distill_core::entity::{Confidence, Sentiment, TypedAttributes};
use distill_core::models::DuplicateCluster;

/// Relative difference above which two KPI targets materially conflict.
const KPI_TARGET_TOLERANCE: f64 = 0.10;

/// The scorer's verdict for one cluster.
#[derive(Debug, Clone)]
pub struct ConsensusResult {
    pub confidence: Confidence,
    pub contradiction: bool,
    /// Source interview ids carrying the conflicting values.
    pub contradicting_sources: Vec<String>,
    /// All members agree on the type's key field.
    pub agreement: bool,
}

pub struct ConsensusScorer {
    config: ConsensusConfig,
}

impl ConsensusScorer {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// `confidence = min(1, n/divisor) - single_source_penalty[n==1]
    ///  - contradiction_penalty[conflict] + agreement_bonus[agree]`,
    /// clamped to [0, 1].
    pub fn score(&self, cluster: &DuplicateCluster) -> ConsensusResult {
        let source_count = cluster.interview_ids().len().max(1);
        let (contradiction, contradicting_sources) = detect_contradiction(cluster);
        let agreement = key_field_agreement(cluster);

        let mut confidence = (source_count as f64 / self.config.divisor).min(1.0);
        if source_count == 1 {
            confidence -= self.config.single_source_penalty;
        }
        if contradiction {
            confidence -= self.config.contradiction_penalty;
        }
        if agreement {
            confidence += self.config.agreement_bonus;
        }

        ConsensusResult {
            confidence: Confidence::new(confidence),
            contradiction,
            contradicting_sources,
            agreement,
        }
    }
}

/// Attribute-specific conflict detection. Returns the interview ids on the
/// minority side of the conflict (both sides when tied).
fn detect_contradiction(cluster: &DuplicateCluster) -> (bool, Vec<String>) {
    let mut positive: BTreeSet<String> = BTreeSet::new();
    let mut negative: BTreeSet<String> = BTreeSet::new();
    let mut kpi_values: Vec<(f64, String)> = Vec::new();
    let mut headcounts: Vec<(u32, String)> = Vec::new();

    for member in &cluster.members {
        let source = member.source_interview_id.clone();
        match &member.attributes {
            TypedAttributes::PainPoint(attrs) => match attrs.sentiment {
                Some(Sentiment::Positive) => {
                    positive.insert(source);
                }
                Some(Sentiment::Negative) => {
                    negative.insert(source);
                }
                _ => {}
            },
            TypedAttributes::System(attrs) => match attrs.sentiment {
                Some(Sentiment::Positive) => {
                    positive.insert(source);
                }
                Some(Sentiment::Negative) => {
                    negative.insert(source);
                }
                _ => {}
            },
            TypedAttributes::Kpi(attrs) => {
                if let Some(target) = attrs.target {
                    kpi_values.push((target, source));
                }
            }
            TypedAttributes::TeamStructure(attrs) => {
                if let Some(headcount) = attrs.headcount {
                    headcounts.push((headcount, source));
                }
            }
            _ => {}
        }
    }

    // Mixed sentiment on the same object, e.g. "helps" vs "causes problems".
    if !positive.is_empty() && !negative.is_empty() {
        let minority: Vec<String> = if positive.len() < negative.len() {
            positive.into_iter().collect()
        } else if negative.len() < positive.len() {
            negative.into_iter().collect()
        } else {
            positive.into_iter().chain(negative).collect()
        };
        return (true, minority);
    }

    // Materially different KPI targets.
    if let Some((baseline, _)) = kpi_values.first() {
        let conflicting: Vec<String> = kpi_values
            .iter()
            .filter(|(value, _)| relative_diff(*baseline, *value) > KPI_TARGET_TOLERANCE)
            .map(|(_, source)| source.clone())
            .collect();
        if !conflicting.is_empty() {
            return (true, conflicting);
        }
    }

    // Conflicting headcounts for the same team.
    if let Some((baseline, _)) = headcounts.first() {
        let conflicting: Vec<String> = headcounts
            .iter()
            .filter(|(value, _)| value != baseline)
            .map(|(_, source)| source.clone())
            .collect();
        if !conflicting.is_empty() {
            return (true, conflicting);
        }
    }

    (false, vec![])
}

fn relative_diff(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale < f64::EPSILON {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Whether all members agree on the type's key field. Requires every member
/// to actually carry the field.
fn key_field_agreement(cluster: &DuplicateCluster) -> bool {
    if cluster.members.len() < 2 {
        return false;
    }
    let keys: Vec<Option<String>> = cluster
        .members
        .iter()
        .map(|m| match &m.attributes {
            TypedAttributes::PainPoint(a) => a.sentiment.map(|s| format!("{s:?}")),
            TypedAttributes::System(a) => a.sentiment.map(|s| format!("{s:?}")),
            TypedAttributes::Process(a) => a.department.clone(),
            TypedAttributes::Kpi(a) => a.unit.clone(),
            TypedAttributes::AutomationCandidate(a) => a.impact.clone(),
            TypedAttributes::TeamStructure(a) => a.headcount.map(|h| h.to_string()),
        })
        .collect();
    let first = match &keys[0] {
        Some(value) => value,
        None => return false,
    };
    keys.iter().all(|k| k.as_deref() == Some(first.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use distill_core::entity::attributes::{KpiAttributes, SystemAttributes};
    use distill_core::entity::{EntityType, RawEntity};
    use distill_core::models::DuplicateCluster;

    fn make_system(id: &str, interview: &str, sentiment: Sentiment) -> RawEntity {
        RawEntity {
            id: id.to_string(),
            entity_type: EntityType::System,
            org_id: "org-a".to_string(),
            source_interview_id: interview.to_string(),
            name: "SAP".to_string(),
            description: "erp platform".to_string(),
            attributes: TypedAttributes::System(SystemAttributes {
                category: Some("erp".to_string()),
                sentiment: Some(sentiment),
                pain_points_addressed: vec![],
            }),
            extracted_at: Utc::now(),
        }
    }

    fn cluster_of(members: Vec<RawEntity>) -> DuplicateCluster {
        let primary_id = members[0].id.clone();
        DuplicateCluster {
            entity_type: members[0].entity_type,
            members,
            primary_id,
            pairs: vec![],
        }
    }

    fn scorer() -> ConsensusScorer {
        ConsensusScorer::new(ConsensusConfig::default())
    }

    #[test]
    fn mixed_sentiment_flags_contradiction_and_reduces_confidence() {
        // 4 negative + 1 positive on the same system.
        let members = vec![
            make_system("a", "i1", Sentiment::Negative),
            make_system("b", "i2", Sentiment::Negative),
            make_system("c", "i3", Sentiment::Negative),
            make_system("d", "i4", Sentiment::Negative),
            make_system("e", "i5", Sentiment::Positive),
        ];
        let result = scorer().score(&cluster_of(members));
        assert!(result.contradiction);
        assert_eq!(result.contradicting_sources, vec!["i5".to_string()]);
        // min(1, 5/5) - 0.2 contradiction penalty
        assert!((result.confidence.value() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn unanimous_sentiment_earns_agreement_bonus() {
        let members = vec![
            make_system("a", "i1", Sentiment::Negative),
            make_system("b", "i2", Sentiment::Negative),
        ];
        let result = scorer().score(&cluster_of(members));
        assert!(!result.contradiction);
        assert!(result.agreement);
        // min(1, 2/5) + 0.1 agreement bonus
        assert!((result.confidence.value() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_source_is_penalized() {
        let members = vec![make_system("a", "i1", Sentiment::Negative)];
        let result = scorer().score(&cluster_of(members));
        // min(1, 1/5) - 0.2 single-source penalty
        assert!((result.confidence.value() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn kpi_target_conflict_is_detected() {
        let make_kpi = |id: &str, interview: &str, target: f64| RawEntity {
            id: id.to_string(),
            entity_type: EntityType::Kpi,
            org_id: "org-a".to_string(),
            source_interview_id: interview.to_string(),
            name: "invoice cycle time".to_string(),
            description: "days from shipment to invoice".to_string(),
            attributes: TypedAttributes::Kpi(KpiAttributes {
                unit: Some("days".to_string()),
                target: Some(target),
                current: None,
                measures_process: None,
            }),
            extracted_at: Utc::now(),
        };
        let result = scorer().score(&cluster_of(vec![
            make_kpi("a", "i1", 5.0),
            make_kpi("b", "i2", 30.0),
        ]));
        assert!(result.contradiction);
        assert_eq!(result.contradicting_sources, vec!["i2".to_string()]);
    }

    #[test]
    fn confidence_is_always_in_unit_interval() {
        let members = vec![make_system("a", "i1", Sentiment::Positive)];
        let result = scorer().score(&cluster_of(members));
        let v = result.confidence.value();
        assert!((0.0..=1.0).contains(&v));
    }
}
