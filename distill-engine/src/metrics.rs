//! Run metrics accumulation. The builder is owned by the orchestrator and
//! threaded through the run explicitly — there is no global accumulator.

use std::time::Instant;

use distill_core::models::{DegradationEvent, RunMetrics, SkippedItem};

/// Accumulates counters during a run and finalizes into `RunMetrics`.
pub struct RunMetricsBuilder {
    started: Instant,
    entities_processed: usize,
    duplicates_found: usize,
    entities_merged: usize,
    contradictions_detected: usize,
    relationships_discovered: usize,
    patterns_found: usize,
    embedding_calls_saved: usize,
    confidence_sum: f64,
    degraded: bool,
    skipped: Vec<SkippedItem>,
    degradation_events: Vec<DegradationEvent>,
}

impl RunMetricsBuilder {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            entities_processed: 0,
            duplicates_found: 0,
            entities_merged: 0,
            contradictions_detected: 0,
            relationships_discovered: 0,
            patterns_found: 0,
            embedding_calls_saved: 0,
            confidence_sum: 0.0,
            degraded: false,
            skipped: Vec::new(),
            degradation_events: Vec::new(),
        }
    }

    pub fn add_processed(&mut self, count: usize) {
        self.entities_processed += count;
    }

    /// A cluster of size n contributes n-1 detected duplicates.
    pub fn add_duplicates(&mut self, count: usize) {
        self.duplicates_found += count;
    }

    pub fn add_merge(&mut self, confidence: f64, contradiction: bool) {
        self.entities_merged += 1;
        self.confidence_sum += confidence;
        if contradiction {
            self.contradictions_detected += 1;
        }
    }

    pub fn add_saved_calls(&mut self, count: usize) {
        self.embedding_calls_saved += count;
    }

    pub fn set_relationships(&mut self, count: usize) {
        self.relationships_discovered = count;
    }

    pub fn set_patterns(&mut self, count: usize) {
        self.patterns_found = count;
    }

    pub fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    pub fn add_skipped(&mut self, items: Vec<SkippedItem>) {
        self.skipped.extend(items);
    }

    pub fn add_degradation_events(&mut self, events: Vec<DegradationEvent>) {
        if !events.is_empty() {
            self.degraded = true;
            self.degradation_events.extend(events);
        }
    }

    pub fn entities_processed(&self) -> usize {
        self.entities_processed
    }

    pub fn entities_merged(&self) -> usize {
        self.entities_merged
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn finish(self, cache_hit_rate: f64) -> RunMetrics {
        let avg_confidence = if self.entities_merged > 0 {
            self.confidence_sum / self.entities_merged as f64
        } else {
            0.0
        };
        RunMetrics {
            entities_processed: self.entities_processed,
            duplicates_found: self.duplicates_found,
            entities_merged: self.entities_merged,
            contradictions_detected: self.contradictions_detected,
            relationships_discovered: self.relationships_discovered,
            patterns_found: self.patterns_found,
            avg_confidence,
            processing_time_ms: self.started.elapsed().as_millis() as u64,
            cache_hit_rate,
            embedding_calls_saved: self.embedding_calls_saved,
            degraded: self.degraded,
            skipped: self.skipped,
            degradation_events: self.degradation_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_confidence_over_merges() {
        let mut builder = RunMetricsBuilder::start();
        builder.add_merge(0.8, false);
        builder.add_merge(0.4, true);
        let metrics = builder.finish(0.0);
        assert!((metrics.avg_confidence - 0.6).abs() < 1e-9);
        assert_eq!(metrics.contradictions_detected, 1);
    }

    #[test]
    fn empty_run_has_zero_confidence_not_nan() {
        let metrics = RunMetricsBuilder::start().finish(0.0);
        assert_eq!(metrics.avg_confidence, 0.0);
    }

    #[test]
    fn degradation_events_mark_the_run_degraded() {
        let mut builder = RunMetricsBuilder::start();
        builder.add_degradation_events(vec![DegradationEvent {
            component: "similarity_matcher".to_string(),
            failure: "timeout".to_string(),
            fallback_used: "lexical-only".to_string(),
            timestamp: chrono::Utc::now(),
        }]);
        assert!(builder.is_degraded());
    }
}
