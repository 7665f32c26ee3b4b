/// Malformed input data. Local to one entity: the offending record is
/// excluded from clustering and logged, the run continues.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    #[error("entity {entity_id} is missing required field {field}")]
    MissingField { entity_id: String, field: String },

    #[error("entity {entity_id} declares type {declared} but carries {found} attributes")]
    AttributeTypeMismatch {
        entity_id: String,
        declared: String,
        found: String,
    },

    #[error("run produced zero output from {input_count} non-empty input entities")]
    ZeroOutputAnomaly { input_count: usize },
}
