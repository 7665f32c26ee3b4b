pub mod audit;
pub mod cluster;
pub mod pattern;
pub mod relationship;
pub mod report;
pub mod snapshot;

pub use audit::{AuditRecord, RollbackOutcome, RunStatus};
pub use cluster::{DuplicateCluster, PairDecision, PairScore};
pub use pattern::{Pattern, PatternType};
pub use relationship::{InferenceRule, Relationship, RelationshipType};
pub use report::{DegradationEvent, RunMetrics, RunReport, SkippedItem};
pub use snapshot::EntitySnapshot;
