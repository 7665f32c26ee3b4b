use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Pattern recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Minimum source_count for a recurring-issue pattern.
    pub recurring_floor: usize,
    /// Minimum distinct negative pain-point links for a problematic resource.
    pub problematic_link_floor: usize,
    /// Corpus share above which a pattern is flagged high priority.
    pub high_priority_share: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            recurring_floor: defaults::DEFAULT_RECURRING_FLOOR,
            problematic_link_floor: defaults::DEFAULT_PROBLEMATIC_LINK_FLOOR,
            high_priority_share: defaults::DEFAULT_HIGH_PRIORITY_SHARE,
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.high_priority_share) {
            return Err(ConfigError::PenaltyOutOfRange {
                name: "high_priority_share".to_string(),
                value: self.high_priority_share,
            });
        }
        Ok(())
    }
}
