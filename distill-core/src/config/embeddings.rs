use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding provider and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Remote embedding service endpoint. None selects the deterministic
    /// offline provider (tests, air-gapped runs).
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Bounded retry count before a pair degrades to lexical-only.
    pub max_retries: u32,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: defaults::DEFAULT_EMBEDDING_TIMEOUT_MS,
            max_retries: defaults::DEFAULT_EMBEDDING_MAX_RETRIES,
            cache_ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_CACHE_CAPACITY,
        }
    }
}
