pub mod config_error;
pub mod consolidation_error;
pub mod embedding_error;
pub mod integrity_error;
pub mod rollback_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use consolidation_error::ConsolidationError;
pub use embedding_error::EmbeddingError;
pub use integrity_error::IntegrityError;
pub use rollback_error::RollbackError;
pub use storage_error::StorageError;

/// Top-level error type. Every subsystem error converts into this.
#[derive(Debug, thiserror::Error)]
pub enum DistillError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("data integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rollback error: {0}")]
    Rollback(#[from] RollbackError),

    #[error("consolidation error: {0}")]
    Consolidation(#[from] ConsolidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DistillResult<T> = Result<T, DistillError>;
