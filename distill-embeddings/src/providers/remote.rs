//! Remote embedding provider over HTTP with timeout and bounded retry.
//!
//! The only legitimate blocking point in a consolidation run. After the
//! retry budget is spent the error propagates and the pair falls back to
//! lexical-only decisioning upstream.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use distill_core::config::EmbeddingConfig;
use distill_core::errors::{DistillError, DistillResult, EmbeddingError};
use distill_core::traits::EmbeddingProvider;

/// Backoff base between retries.
const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Calls an external embedding service.
pub struct RemoteProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    timeout_ms: u64,
    max_retries: u32,
    dimensions: usize,
}

impl RemoteProvider {
    pub fn new(endpoint: String, config: &EmbeddingConfig, dimensions: usize) -> DistillResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                DistillError::Embedding(EmbeddingError::ProviderUnavailable {
                    provider: format!("http client: {e}"),
                })
            })?;
        Ok(Self {
            client,
            endpoint,
            timeout_ms: config.timeout_ms,
            max_retries: config.max_retries,
            dimensions,
        })
    }

    /// One request attempt, without retry.
    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { texts })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    EmbeddingError::ProviderUnavailable {
                        provider: e.to_string(),
                    }
                }
            })?;

        if response.status().as_u16() == 429 {
            return Err(EmbeddingError::RateLimited {
                reason: "429 from embedding service".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("status {}", response.status()),
            });
        }

        let body: EmbedResponse = response.json().map_err(|e| EmbeddingError::InferenceFailed {
            reason: format!("malformed response: {e}"),
        })?;

        for embedding in &body.embeddings {
            if embedding.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.len(),
                });
            }
        }
        Ok(body.embeddings)
    }

    /// Bounded retry with linear backoff.
    fn request_with_retry(&self, texts: &[String]) -> DistillResult<Vec<Vec<f32>>> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.request(texts) {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    warn!(attempt, error = %e, "embedding request failed");
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        std::thread::sleep(Duration::from_millis(
                            RETRY_BACKOFF_MS * (attempt as u64 + 1),
                        ));
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or(EmbeddingError::ProviderUnavailable {
                provider: self.endpoint.clone(),
            })
            .into())
    }
}

impl EmbeddingProvider for RemoteProvider {
    fn embed(&self, text: &str) -> DistillResult<Vec<f32>> {
        let texts = vec![text.to_string()];
        let mut embeddings = self.request_with_retry(&texts)?;
        embeddings.pop().ok_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "empty response".to_string(),
            }
            .into()
        })
    }

    fn embed_batch(&self, texts: &[String]) -> DistillResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let embeddings = self.request_with_retry(texts)?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("asked for {} embeddings, got {}", texts.len(), embeddings.len()),
            }
            .into());
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "remote"
    }

    fn is_available(&self) -> bool {
        true
    }
}
