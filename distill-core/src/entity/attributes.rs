use serde::{Deserialize, Serialize};

use super::entity_type::EntityType;

/// Sentiment expressed by an interviewee about an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Typed attribute wrapper — each entity type has its own attribute struct.
/// Serialized as a tagged enum so the type is preserved in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum TypedAttributes {
    PainPoint(PainPointAttributes),
    Process(ProcessAttributes),
    System(SystemAttributes),
    Kpi(KpiAttributes),
    AutomationCandidate(AutomationCandidateAttributes),
    TeamStructure(TeamStructureAttributes),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PainPointAttributes {
    #[serde(default)]
    pub department: Option<String>,
    /// How often the pain occurs, in the interviewee's words ("daily", "monthly").
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessAttributes {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    /// Names of systems the process runs on, as mentioned.
    #[serde(default)]
    pub systems_involved: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemAttributes {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    /// Pain point names or ids this system is said to address.
    #[serde(default)]
    pub pain_points_addressed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KpiAttributes {
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub current: Option<f64>,
    /// Process name or id this KPI measures.
    #[serde(default)]
    pub measures_process: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AutomationCandidateAttributes {
    #[serde(default)]
    pub effort: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    /// Pain point name or id this candidate addresses.
    #[serde(default)]
    pub addresses_pain_point: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamStructureAttributes {
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub headcount: Option<u32>,
}

impl TypedAttributes {
    /// Empty attributes for the given entity type.
    pub fn empty(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::PainPoint => Self::PainPoint(PainPointAttributes::default()),
            EntityType::Process => Self::Process(ProcessAttributes::default()),
            EntityType::System => Self::System(SystemAttributes::default()),
            EntityType::Kpi => Self::Kpi(KpiAttributes::default()),
            EntityType::AutomationCandidate => {
                Self::AutomationCandidate(AutomationCandidateAttributes::default())
            }
            EntityType::TeamStructure => Self::TeamStructure(TeamStructureAttributes::default()),
        }
    }

    /// The entity type these attributes belong to.
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::PainPoint(_) => EntityType::PainPoint,
            Self::Process(_) => EntityType::Process,
            Self::System(_) => EntityType::System,
            Self::Kpi(_) => EntityType::Kpi,
            Self::AutomationCandidate(_) => EntityType::AutomationCandidate,
            Self::TeamStructure(_) => EntityType::TeamStructure,
        }
    }

    /// Sentiment, for the types that carry one.
    pub fn sentiment(&self) -> Option<Sentiment> {
        match self {
            Self::PainPoint(a) => a.sentiment,
            Self::System(a) => a.sentiment,
            _ => None,
        }
    }

    /// Department, for the types that carry one.
    pub fn department(&self) -> Option<&str> {
        match self {
            Self::PainPoint(a) => a.department.as_deref(),
            Self::Process(a) => a.department.as_deref(),
            Self::TeamStructure(a) => a.department.as_deref(),
            _ => None,
        }
    }
}
