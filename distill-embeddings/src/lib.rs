//! # distill-embeddings
//!
//! Embedding providers for the consolidation engine: a remote HTTP provider
//! with timeout and bounded retry, a deterministic offline provider, and a
//! normalized-text cache with hit/miss accounting.

pub mod cache;
pub mod engine;
pub mod normalize;
pub mod providers;

pub use cache::EmbeddingCache;
pub use engine::EmbeddingEngine;
pub use providers::{HashedProvider, RemoteProvider};
