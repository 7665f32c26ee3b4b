//! SimilarityMatcher — lexical scoring plus cache-backed semantic scoring
//! with explicit unavailability.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use dashmap::DashMap;
use tracing::warn;

use distill_core::models::DegradationEvent;
use distill_embeddings::normalize::cache_key;
use distill_embeddings::EmbeddingEngine;

use crate::similarity::{cosine_similarity, lexical_similarity};

/// Computes lexical and semantic similarity between entity texts. Semantic
/// unavailability is surfaced as `None`, never as a zero score — an
/// embedding failure must not read as "not a duplicate".
pub struct SimilarityMatcher {
    embeddings: Arc<EmbeddingEngine>,
    /// Per-run memo of pairwise semantic scores, keyed by ordered cache keys.
    pair_memo: DashMap<(String, String), Option<f64>>,
    /// Degradation events recorded when the provider fails.
    events: Mutex<Vec<DegradationEvent>>,
}

impl SimilarityMatcher {
    pub fn new(embeddings: Arc<EmbeddingEngine>) -> Self {
        Self {
            embeddings,
            pair_memo: DashMap::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Normalized lexical similarity. Pure, no side effects.
    pub fn lexical(&self, a: &str, b: &str) -> f64 {
        lexical_similarity(a, b)
    }

    /// Cosine similarity over provider embeddings, or `None` when the
    /// provider is unavailable for this pair after its bounded retries.
    pub fn semantic(&self, a: &str, b: &str) -> Option<f64> {
        let (key_a, key_b) = ordered_keys(a, b);
        if let Some(memoized) = self.pair_memo.get(&(key_a.clone(), key_b.clone())) {
            return *memoized;
        }

        let result = match (self.embeddings.embed(a), self.embeddings.embed(b)) {
            (Ok(vec_a), Ok(vec_b)) => Some(cosine_similarity(&vec_a, &vec_b)),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "embedding unavailable, pair degrades to lexical-only");
                if let Ok(mut events) = self.events.lock() {
                    events.push(DegradationEvent {
                        component: "similarity_matcher".to_string(),
                        failure: e.to_string(),
                        fallback_used: "lexical-only".to_string(),
                        timestamp: Utc::now(),
                    });
                }
                None
            }
        };

        self.pair_memo.insert((key_a, key_b), result);
        result
    }

    /// Embedding cache hit rate for the run report.
    pub fn cache_hit_rate(&self) -> f64 {
        self.embeddings.cache_hit_rate()
    }

    /// Drain degradation events recorded so far.
    pub fn drain_events(&self) -> Vec<DegradationEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

fn ordered_keys(a: &str, b: &str) -> (String, String) {
    let key_a = cache_key(a);
    let key_b = cache_key(b);
    if key_a <= key_b {
        (key_a, key_b)
    } else {
        (key_b, key_a)
    }
}
