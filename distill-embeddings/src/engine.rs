//! EmbeddingEngine — a provider wrapped with the normalized-text cache.

use distill_core::config::EmbeddingConfig;
use distill_core::errors::DistillResult;
use distill_core::traits::EmbeddingProvider;

use crate::cache::EmbeddingCache;
use crate::normalize::cache_key;
use crate::providers::{HashedProvider, RemoteProvider};

/// Expected dimensionality of the remote embedding service.
const REMOTE_DIMENSIONS: usize = 384;

/// Caching front for any embedding provider. This is what the similarity
/// matcher holds: lookups go through the cache, misses hit the provider,
/// and the hit rate feeds the run report.
pub struct EmbeddingEngine {
    provider: Box<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
}

impl EmbeddingEngine {
    pub fn new(provider: Box<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(config.cache_capacity, config.cache_ttl_secs),
        }
    }

    /// Build from config: remote when an endpoint is configured, otherwise
    /// the deterministic offline provider.
    pub fn from_config(config: &EmbeddingConfig) -> DistillResult<Self> {
        let provider: Box<dyn EmbeddingProvider> = match &config.endpoint {
            Some(endpoint) => {
                Box::new(RemoteProvider::new(endpoint.clone(), config, REMOTE_DIMENSIONS)?)
            }
            None => Box::new(HashedProvider::default()),
        };
        Ok(Self::new(provider, config))
    }

    /// Embed through the cache.
    pub fn embed(&self, text: &str) -> DistillResult<Vec<f32>> {
        let key = cache_key(text);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let embedding = self.provider.embed(text)?;
        self.cache.insert(key, embedding.clone());
        Ok(embedding)
    }

    /// Cache hit rate since construction.
    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.hit_rate()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}
