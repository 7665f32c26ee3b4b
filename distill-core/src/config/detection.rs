use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::entity::EntityType;
use crate::errors::ConfigError;

/// Per-entity-type similarity knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TypeThresholds {
    /// Lexical similarity below which the pair is rejected without an
    /// embedding call.
    pub lexical_floor: f64,
    /// Semantic similarity at or above which the pair is a duplicate.
    pub semantic_threshold: f64,
}

/// Duplicate detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Lexical similarity at or above which a pair is a duplicate without an
    /// embedding call.
    pub skip_semantic_threshold: f64,
    /// Bounded candidate window per entity.
    pub max_candidates: usize,
    /// Per-type thresholds. Every known entity type must be present.
    pub per_type: BTreeMap<EntityType, TypeThresholds>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let mut per_type = BTreeMap::new();
        let floor = defaults::DEFAULT_LEXICAL_FLOOR;
        let entries = [
            (EntityType::PainPoint, defaults::DEFAULT_SEMANTIC_PAIN_POINT),
            (EntityType::Process, defaults::DEFAULT_SEMANTIC_PROCESS),
            (EntityType::System, defaults::DEFAULT_SEMANTIC_SYSTEM),
            (EntityType::Kpi, defaults::DEFAULT_SEMANTIC_KPI),
            (
                EntityType::AutomationCandidate,
                defaults::DEFAULT_SEMANTIC_AUTOMATION_CANDIDATE,
            ),
            (
                EntityType::TeamStructure,
                defaults::DEFAULT_SEMANTIC_TEAM_STRUCTURE,
            ),
        ];
        for (entity_type, semantic_threshold) in entries {
            per_type.insert(
                entity_type,
                TypeThresholds {
                    lexical_floor: floor,
                    semantic_threshold,
                },
            );
        }
        Self {
            skip_semantic_threshold: defaults::DEFAULT_SKIP_SEMANTIC_THRESHOLD,
            max_candidates: defaults::DEFAULT_MAX_CANDIDATES,
            per_type,
        }
    }
}

impl DetectionConfig {
    /// Thresholds for an entity type. `validate` guarantees presence, so a
    /// missing entry is only possible on an unvalidated config.
    pub fn thresholds_for(&self, entity_type: EntityType) -> Result<TypeThresholds, ConfigError> {
        self.per_type
            .get(&entity_type)
            .copied()
            .ok_or_else(|| ConfigError::MissingThresholds {
                entity_type: entity_type.to_string(),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_candidates == 0 {
            return Err(ConfigError::InvalidCandidateWindow);
        }
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.skip_semantic_threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                entity_type: "<global>".to_string(),
                name: "skip_semantic_threshold".to_string(),
                value: self.skip_semantic_threshold,
            });
        }
        for entity_type in EntityType::ALL {
            let t = self.thresholds_for(entity_type)?;
            if !in_unit(t.lexical_floor) {
                return Err(ConfigError::ThresholdOutOfRange {
                    entity_type: entity_type.to_string(),
                    name: "lexical_floor".to_string(),
                    value: t.lexical_floor,
                });
            }
            if !in_unit(t.semantic_threshold) {
                return Err(ConfigError::ThresholdOutOfRange {
                    entity_type: entity_type.to_string(),
                    name: "semantic_threshold".to_string(),
                    value: t.semantic_threshold,
                });
            }
            if t.lexical_floor > t.semantic_threshold {
                return Err(ConfigError::FloorAboveThreshold {
                    entity_type: entity_type.to_string(),
                    floor: t.lexical_floor,
                    threshold: t.semantic_threshold,
                });
            }
        }
        Ok(())
    }
}
