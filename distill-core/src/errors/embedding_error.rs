/// Embedding provider errors. All transient: the engine retries with
/// backoff, then degrades to lexical-only decisioning for the pair.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("embedding provider rate limited: {reason}")]
    RateLimited { reason: String },

    #[error("embedding provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
