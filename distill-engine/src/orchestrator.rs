//! ConsolidationOrchestrator — drives a run end to end: load, detect, score,
//! merge per type, then discover relationships and recognize patterns over
//! the merged whole, persist the audit trail, and validate invariants.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use distill_core::config::DistillConfig;
use distill_core::entity::{ConsolidatedEntity, EntityType};
use distill_core::errors::{ConsolidationError, DistillResult};
use distill_core::models::{AuditRecord, RunReport, RunStatus};
use distill_core::traits::EntityStore;
use distill_embeddings::EmbeddingEngine;

use crate::consensus::ConsensusScorer;
use crate::detector::DuplicateDetector;
use crate::matcher::SimilarityMatcher;
use crate::merger::EntityMerger;
use crate::metrics::RunMetricsBuilder;
use crate::patterns::PatternRecognizer;
use crate::relationships::RelationshipDiscoverer;
use crate::validate;

pub struct ConsolidationOrchestrator {
    store: Arc<dyn EntityStore>,
    matcher: Arc<SimilarityMatcher>,
    config: DistillConfig,
    /// Only one consolidation run at a time.
    is_running: AtomicBool,
    /// Cooperative cancellation, checked between type batches and between
    /// merges — never mid-transaction.
    cancel: Arc<AtomicBool>,
}

impl ConsolidationOrchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        embeddings: Arc<EmbeddingEngine>,
        config: DistillConfig,
    ) -> Self {
        Self {
            store,
            matcher: Arc::new(SimilarityMatcher::new(embeddings)),
            config,
            is_running: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for signalling cancellation from another thread.
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Execute a consolidation pass over `scope` (all types when None).
    /// `dry_run` computes everything but writes nothing.
    pub fn run(
        &self,
        scope: Option<Vec<EntityType>>,
        dry_run: bool,
    ) -> DistillResult<RunReport> {
        // Fatal before any write.
        self.config.validate()?;

        if self
            .is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ConsolidationError::AlreadyRunning.into());
        }

        let result = self.run_inner(scope, dry_run);
        self.is_running.store(false, Ordering::SeqCst);
        result
    }

    fn run_inner(
        &self,
        scope: Option<Vec<EntityType>>,
        dry_run: bool,
    ) -> DistillResult<RunReport> {
        let scope = scope.unwrap_or_else(|| EntityType::ALL.to_vec());
        let audit_id = uuid::Uuid::new_v4().to_string();
        let mut record = AuditRecord::open(audit_id.clone(), scope.clone());
        if !dry_run {
            self.store.insert_audit(&record)?;
        }

        info!(audit_id = %audit_id, scope = ?scope, dry_run, "consolidation run started");

        let mut metrics = RunMetricsBuilder::start();
        let mut warnings: Vec<String> = Vec::new();
        let mut merged: Vec<ConsolidatedEntity> = Vec::new();

        let merge_outcome =
            self.merge_phase(&audit_id, &scope, dry_run, &mut metrics, &mut merged);
        metrics.add_degradation_events(self.matcher.drain_events());

        let status = match merge_outcome {
            Ok(status) => status,
            Err(e) => {
                // Transactional integrity is threatened: the run fails whole,
                // but committed merges stand and the audit row says so.
                record.status = RunStatus::Failed;
                record.finished_at = Some(Utc::now());
                record.entities_processed = metrics.entities_processed();
                record.entities_merged = metrics.entities_merged();
                if !dry_run {
                    if let Err(update_err) = self.store.update_audit(&record) {
                        warn!(error = %update_err, "failed to record failed run");
                    }
                }
                return Err(e);
            }
        };

        // Relationship discovery and pattern recognition need the full
        // consolidated set, so they only run after all type merges.
        if status == RunStatus::Completed {
            let consolidated_set = if dry_run {
                merged.clone()
            } else {
                self.store.all_consolidated()?
            };
            let relationships = RelationshipDiscoverer::discover(&consolidated_set, &audit_id);
            let patterns = PatternRecognizer::new(self.config.patterns.clone()).recognize(
                &consolidated_set,
                &relationships,
                &audit_id,
            );
            metrics.set_relationships(relationships.len());
            metrics.set_patterns(patterns.len());
            if !dry_run {
                self.store.replace_relationships(&audit_id, &relationships)?;
                self.store.replace_patterns(&audit_id, &patterns)?;
            }
        }

        // No silent zero-output: producing nothing from a non-empty input is
        // an anomaly, never a quiet success.
        if status == RunStatus::Completed && metrics.entities_processed() == 0 {
            let raw_remaining: usize = scope
                .iter()
                .map(|&t| self.store.load_unconsolidated(t).map(|v| v.len()))
                .collect::<DistillResult<Vec<_>>>()?
                .into_iter()
                .sum();
            if raw_remaining > 0 {
                metrics.mark_degraded();
                warnings.push(format!(
                    "zero-output anomaly: {raw_remaining} raw entities in scope produced no output"
                ));
            }
        }

        // Post-run invariant validation: violations are surfaced as
        // warnings, not auto-corrected.
        if !dry_run && status == RunStatus::Completed {
            let validation = validate::validate_store(&self.store, Some(&audit_id))?;
            warnings.extend(validation.failures());
        }

        record.status = status;
        record.finished_at = Some(Utc::now());
        record.entities_processed = metrics.entities_processed();
        record.entities_merged = metrics.entities_merged();
        record.degraded = metrics.is_degraded();
        if !dry_run {
            self.store.update_audit(&record)?;
        }

        let metrics = metrics.finish(self.matcher.cache_hit_rate());
        info!(
            audit_id = %audit_id,
            status = %status,
            processed = metrics.entities_processed,
            merged = metrics.entities_merged,
            relationships = metrics.relationships_discovered,
            patterns = metrics.patterns_found,
            saved_calls = metrics.embedding_calls_saved,
            "consolidation run finished"
        );

        Ok(RunReport {
            audit_id,
            status,
            dry_run,
            metrics,
            warnings,
        })
    }

    /// Detect and merge per entity type. Returns Cancelled when the token
    /// fires between batches or merges; merge errors propagate after the
    /// merger's single retry.
    fn merge_phase(
        &self,
        audit_id: &str,
        scope: &[EntityType],
        dry_run: bool,
        metrics: &mut RunMetricsBuilder,
        merged: &mut Vec<ConsolidatedEntity>,
    ) -> DistillResult<RunStatus> {
        let detector = DuplicateDetector::new(
            Arc::clone(&self.matcher),
            self.config.detection.clone(),
        );
        let scorer = ConsensusScorer::new(self.config.consensus.clone());
        let merger = EntityMerger::new(Arc::clone(&self.store));

        for &entity_type in scope {
            if self.cancel.load(Ordering::Relaxed) {
                info!(entity_type = %entity_type, "cancellation observed between type batches");
                return Ok(RunStatus::Cancelled);
            }

            let raw_entities = self.store.load_unconsolidated(entity_type)?;
            if raw_entities.is_empty() {
                continue;
            }
            metrics.add_processed(raw_entities.len());

            let outcome = detector.detect(entity_type, raw_entities)?;
            if outcome.degraded {
                metrics.mark_degraded();
            }
            metrics.add_saved_calls(outcome.saved_embedding_calls);
            metrics.add_skipped(outcome.skipped);

            for cluster in &outcome.clusters {
                if self.cancel.load(Ordering::Relaxed) {
                    info!(entity_type = %entity_type, "cancellation observed between merges");
                    return Ok(RunStatus::Cancelled);
                }

                metrics.add_duplicates(cluster.size().saturating_sub(1));
                let consensus = scorer.score(cluster);
                let consolidated = merger.build(audit_id, cluster, &consensus);
                if !dry_run {
                    merger.persist(audit_id, cluster, &consolidated)?;
                }
                metrics.add_merge(
                    consolidated.consensus_confidence.value(),
                    consolidated.contradiction_flag,
                );
                merged.push(consolidated);
            }
        }
        Ok(RunStatus::Completed)
    }
}
