use serde::{Deserialize, Serialize};

/// The typed edges discovered between consolidated entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// A process runs on a system.
    Uses,
    /// A system is implicated in a pain point.
    Causes,
    /// A KPI measures a process.
    Measures,
    /// An automation candidate or system addresses a pain point.
    Addresses,
}

impl RelationshipType {
    /// All variants for iteration.
    pub const ALL: [RelationshipType; 4] =
        [Self::Uses, Self::Causes, Self::Measures, Self::Addresses];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uses => "uses",
            Self::Causes => "causes",
            Self::Measures => "measures",
            Self::Addresses => "addresses",
        }
    }
}

/// Which inference rule produced a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceRule {
    /// A foreign-key-like attribute named the target explicitly.
    ExplicitAttribute,
    /// The target's name appears in the source's text.
    NameMention,
    /// Salient keyword overlap between the two descriptions.
    KeywordOverlap,
}

/// A typed edge between two consolidated entities. Derived and regenerable:
/// safe to delete and recompute. Both endpoints always share one org_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Deterministic id so re-discovery is idempotent.
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    /// Strength of the match that produced this edge, 0.0–1.0.
    pub confidence: f64,
    pub rule: InferenceRule,
    /// Text fragments supporting the edge.
    pub evidence: Vec<String>,
    /// The run that discovered this edge.
    pub audit_id: String,
}

impl Relationship {
    /// Deterministic edge id: blake3 of (source, target, type). Re-running
    /// discovery on the same consolidated set reproduces the same ids.
    pub fn edge_id(source_id: &str, target_id: &str, rel_type: RelationshipType) -> String {
        let key = format!("{source_id}|{target_id}|{}", rel_type.as_str());
        blake3::hash(key.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_is_deterministic() {
        let a = Relationship::edge_id("s1", "t1", RelationshipType::Uses);
        let b = Relationship::edge_id("s1", "t1", RelationshipType::Uses);
        assert_eq!(a, b);
    }

    #[test]
    fn edge_id_distinguishes_type_and_direction() {
        let uses = Relationship::edge_id("s1", "t1", RelationshipType::Uses);
        let causes = Relationship::edge_id("s1", "t1", RelationshipType::Causes);
        let reversed = Relationship::edge_id("t1", "s1", RelationshipType::Uses);
        assert_ne!(uses, causes);
        assert_ne!(uses, reversed);
    }
}
