use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attributes::TypedAttributes;
use super::entity_type::EntityType;
use crate::errors::IntegrityError;

/// One extracted mention from an interview. Immutable once extracted;
/// the consolidation engine reads these and only ever marks them as
/// absorbed into a consolidated entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntity {
    /// Identifier assigned by the extraction subsystem.
    pub id: String,
    pub entity_type: EntityType,
    /// Organization namespace. Entities never consolidate across orgs.
    pub org_id: String,
    /// The interview this mention came from.
    pub source_interview_id: String,
    /// Short name as the interviewee phrased it ("SAP", "late invoicing").
    pub name: String,
    /// Free-text description of the mention.
    pub description: String,
    /// Typed per-entity-type attributes — per-type struct, NOT a JSON blob.
    pub attributes: TypedAttributes,
    pub extracted_at: DateTime<Utc>,
}

impl RawEntity {
    /// The text representation used for similarity matching and embedding.
    pub fn match_text(&self) -> String {
        if self.description.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.description)
        }
    }

    /// blake3 hash of the serialized entity, used for snapshot verification.
    pub fn content_hash(&self) -> crate::DistillResult<String> {
        let serialized = serde_json::to_string(self)?;
        Ok(blake3::hash(serialized.as_bytes()).to_hex().to_string())
    }

    /// Check the fields the engine cannot work without. A failing entity is
    /// excluded from clustering and reported, never silently dropped.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let missing = |field: &str| IntegrityError::MissingField {
            entity_id: self.id.clone(),
            field: field.to_string(),
        };
        if self.id.trim().is_empty() {
            return Err(IntegrityError::MissingField {
                entity_id: "<unknown>".to_string(),
                field: "id".to_string(),
            });
        }
        if self.org_id.trim().is_empty() {
            return Err(missing("org_id"));
        }
        if self.source_interview_id.trim().is_empty() {
            return Err(missing("source_interview_id"));
        }
        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        if self.attributes.entity_type() != self.entity_type {
            return Err(IntegrityError::AttributeTypeMismatch {
                entity_id: self.id.clone(),
                declared: self.entity_type.to_string(),
                found: self.attributes.entity_type().to_string(),
            });
        }
        Ok(())
    }
}

/// Identity equality: two raw entities are equal if they have the same ID.
impl PartialEq for RawEntity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::attributes::PainPointAttributes;

    fn make_entity() -> RawEntity {
        RawEntity {
            id: "pp-1".to_string(),
            entity_type: EntityType::PainPoint,
            org_id: "org-a".to_string(),
            source_interview_id: "int-1".to_string(),
            name: "late invoicing".to_string(),
            description: "invoices go out weeks late".to_string(),
            attributes: TypedAttributes::PainPoint(PainPointAttributes::default()),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn valid_entity_passes() {
        assert!(make_entity().validate().is_ok());
    }

    #[test]
    fn empty_org_is_rejected() {
        let mut e = make_entity();
        e.org_id = "  ".to_string();
        assert!(e.validate().is_err());
    }

    #[test]
    fn attribute_type_mismatch_is_rejected() {
        let mut e = make_entity();
        e.attributes = TypedAttributes::empty(EntityType::System);
        assert!(matches!(
            e.validate(),
            Err(IntegrityError::AttributeTypeMismatch { .. })
        ));
    }

    #[test]
    fn match_text_falls_back_to_name() {
        let mut e = make_entity();
        e.description.clear();
        assert_eq!(e.match_text(), "late invoicing");
    }

    #[test]
    fn content_hash_is_stable() {
        let e = make_entity();
        assert_eq!(e.content_hash().unwrap(), e.content_hash().unwrap());
    }
}
