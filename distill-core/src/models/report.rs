use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::models::audit::RunStatus;

/// An entity excluded from the run, with the reason it was skipped.
/// Surfaced in the report so partial failure is never silent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedItem {
    pub entity_id: String,
    pub entity_type: EntityType,
    pub reason: String,
}

/// A degradation event: a subsystem fell back to a lower-quality mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegradationEvent {
    pub component: String,
    pub failure: String,
    pub fallback_used: String,
    pub timestamp: DateTime<Utc>,
}

/// Metrics for one consolidation run. Threaded explicitly through the
/// orchestrator and returned — never a process-wide accumulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    pub entities_processed: usize,
    pub duplicates_found: usize,
    pub entities_merged: usize,
    pub contradictions_detected: usize,
    pub relationships_discovered: usize,
    pub patterns_found: usize,
    pub avg_confidence: f64,
    pub processing_time_ms: u64,
    /// Embedding cache hit rate over the run, 0.0–1.0.
    pub cache_hit_rate: f64,
    /// Pairs decided without an embedding call (short-circuit + cheap reject).
    pub embedding_calls_saved: usize,
    /// True when any subsystem fell back to a degraded mode, or when a
    /// non-empty input produced zero output.
    pub degraded: bool,
    pub skipped: Vec<SkippedItem>,
    pub degradation_events: Vec<DegradationEvent>,
}

/// The run report handed back to the caller and printed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub audit_id: String,
    pub status: RunStatus,
    pub dry_run: bool,
    pub metrics: RunMetrics,
    /// Human-readable warnings (invariant violations, anomalies). A non-empty
    /// list downgrades the CLI exit code to success-with-warnings.
    pub warnings: Vec<String>,
}
