pub mod consensus;
pub mod defaults;
pub mod detection;
pub mod embeddings;
pub mod patterns;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use consensus::ConsensusConfig;
pub use detection::{DetectionConfig, TypeThresholds};
pub use embeddings::EmbeddingConfig;
pub use patterns::PatternConfig;

use crate::errors::ConfigError;

/// Top-level configuration, TOML-loadable. Validated before any writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillConfig {
    pub detection: DetectionConfig,
    pub consensus: ConsensusConfig,
    pub patterns: PatternConfig,
    pub embeddings: EmbeddingConfig,
}

impl DistillConfig {
    /// Load from a TOML file. Unknown keys are ignored; missing sections
    /// take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Unparsable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Fatal at startup: no write happens before this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.consensus.validate()?;
        self.patterns.validate()?;
        Ok(())
    }
}
