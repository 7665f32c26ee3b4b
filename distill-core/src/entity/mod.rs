pub mod attributes;
pub mod confidence;
pub mod consolidated;
pub mod entity_type;
pub mod raw;

pub use attributes::{Sentiment, TypedAttributes};
pub use confidence::Confidence;
pub use consolidated::ConsolidatedEntity;
pub use entity_type::EntityType;
pub use raw::RawEntity;
