use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The six entity types produced by interview extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    PainPoint,
    Process,
    System,
    Kpi,
    AutomationCandidate,
    TeamStructure,
}

impl EntityType {
    /// Total number of entity types.
    pub const COUNT: usize = 6;

    /// All variants for iteration.
    pub const ALL: [EntityType; 6] = [
        Self::PainPoint,
        Self::Process,
        Self::System,
        Self::Kpi,
        Self::AutomationCandidate,
        Self::TeamStructure,
    ];

    /// The snake_case wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PainPoint => "pain_point",
            Self::Process => "process",
            Self::System => "system",
            Self::Kpi => "kpi",
            Self::AutomationCandidate => "automation_candidate",
            Self::TeamStructure => "team_structure",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown entity type: {s}"))
    }
}
