/// Invalid configuration. Fatal at startup, before any writes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing thresholds for entity type {entity_type}")]
    MissingThresholds { entity_type: String },

    #[error("threshold {name} = {value} for {entity_type} is outside (0, 1]")]
    ThresholdOutOfRange {
        entity_type: String,
        name: String,
        value: f64,
    },

    #[error("lexical floor {floor} exceeds semantic threshold {threshold} for {entity_type}")]
    FloorAboveThreshold {
        entity_type: String,
        floor: f64,
        threshold: f64,
    },

    #[error("consensus divisor must be positive, got {value}")]
    InvalidDivisor { value: f64 },

    #[error("{name} = {value} is outside [0, 1]")]
    PenaltyOutOfRange { name: String, value: f64 },

    #[error("max_candidates must be at least 1")]
    InvalidCandidateWindow,

    #[error("failed to read config file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    Unparsable { path: String, reason: String },
}
