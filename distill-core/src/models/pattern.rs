use serde::{Deserialize, Serialize};

/// The kinds of cross-entity observation the recognizer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// An entity mentioned by more interviews than the recurring floor.
    RecurringIssue,
    /// A system linked to many distinct negative pain points.
    ProblematicResource,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecurringIssue => "recurring_issue",
            Self::ProblematicResource => "problematic_resource",
        }
    }
}

/// A named, corpus-level observation over the consolidated set.
/// Derived and regenerable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub pattern_type: PatternType,
    /// Human-readable name, e.g. "recurring pain point: late invoicing".
    pub name: String,
    pub org_id: String,
    /// Consolidated entity ids supporting this pattern.
    pub supporting_entity_ids: Vec<String>,
    /// How many independent sources back the pattern.
    pub frequency: usize,
    /// Saturating frequency share, 0.0–1.0.
    pub strength: f64,
    /// Set when the pattern's share of the corpus exceeds the priority cut.
    pub high_priority: bool,
    pub audit_id: String,
}
