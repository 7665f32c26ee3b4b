use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

/// Lifecycle state of one consolidation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Active,
    Completed,
    Cancelled,
    Failed,
    RolledBack,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            "rolled_back" => Ok(Self::RolledBack),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// One row per consolidation run, linking the audit id to run-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: String,
    /// Entity types in scope for this run.
    pub scope: Vec<EntityType>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entities_processed: usize,
    pub entities_merged: usize,
    pub degraded: bool,
    pub rollback_reason: Option<String>,
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl AuditRecord {
    /// A freshly opened, still-active record.
    pub fn open(audit_id: String, scope: Vec<EntityType>) -> Self {
        Self {
            audit_id,
            scope,
            status: RunStatus::Active,
            started_at: Utc::now(),
            finished_at: None,
            entities_processed: 0,
            entities_merged: 0,
            degraded: false,
            rollback_reason: None,
            rolled_back_at: None,
        }
    }
}

/// What a completed rollback removed and restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub audit_id: String,
    pub restored_entities: usize,
    pub removed_consolidated: usize,
    pub removed_relationships: usize,
    pub removed_patterns: usize,
}
