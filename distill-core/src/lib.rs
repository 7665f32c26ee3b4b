//! # distill-core
//!
//! Foundation crate for the Distill consolidation engine.
//! Defines all types, traits, errors, and config.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::DistillConfig;
pub use entity::{Confidence, ConsolidatedEntity, EntityType, RawEntity, Sentiment, TypedAttributes};
pub use errors::{DistillError, DistillResult};
