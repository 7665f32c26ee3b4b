use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::RawEntity;

/// A verbatim pre-merge copy of a raw entity absorbed into a consolidated
/// entity. Written inside the same transaction as the merge; read only by
/// rollback; deleted only by explicit retention cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// The run that merged this entity.
    pub audit_id: String,
    /// The consolidated entity the member was absorbed into.
    pub consolidated_id: String,
    /// The raw entity exactly as it was before the merge.
    pub entity: RawEntity,
    pub created_at: DateTime<Utc>,
}
