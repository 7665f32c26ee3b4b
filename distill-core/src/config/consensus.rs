use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Consensus scoring configuration. All constants of the confidence formula
/// live here — the right values are corpus-dependent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// `min(1, source_count / divisor)` saturates confidence near 1.0 for
    /// well-corroborated facts. Tune to corpus size / expected mention rate.
    pub divisor: f64,
    pub single_source_penalty: f64,
    pub contradiction_penalty: f64,
    pub agreement_bonus: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            divisor: defaults::DEFAULT_CONSENSUS_DIVISOR,
            single_source_penalty: defaults::DEFAULT_SINGLE_SOURCE_PENALTY,
            contradiction_penalty: defaults::DEFAULT_CONTRADICTION_PENALTY,
            agreement_bonus: defaults::DEFAULT_AGREEMENT_BONUS,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.divisor <= 0.0 || !self.divisor.is_finite() {
            return Err(ConfigError::InvalidDivisor {
                value: self.divisor,
            });
        }
        let checks = [
            ("single_source_penalty", self.single_source_penalty),
            ("contradiction_penalty", self.contradiction_penalty),
            ("agreement_bonus", self.agreement_bonus),
        ];
        for (name, value) in checks {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::PenaltyOutOfRange {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}
