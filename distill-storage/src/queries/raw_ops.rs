//! Insert, load, and restore operations for raw entities.

use rusqlite::{params, Connection};

use distill_core::entity::{EntityType, RawEntity, TypedAttributes};
use distill_core::errors::DistillResult;

use crate::to_storage_err;

/// Insert a single raw entity. No transaction of its own — callers scope it.
pub fn insert_raw(conn: &Connection, entity: &RawEntity) -> DistillResult<()> {
    let attributes_json =
        serde_json::to_string(&entity.attributes).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT OR IGNORE INTO raw_entities (
            id, entity_type, org_id, source_interview_id, name, description,
            attributes, extracted_at, consolidated_into
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
        params![
            entity.id,
            entity.entity_type.as_str(),
            entity.org_id,
            entity.source_interview_id,
            entity.name,
            entity.description,
            attributes_json,
            entity.extracted_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Get a single raw entity by id.
pub fn get_raw(conn: &Connection, id: &str) -> DistillResult<Option<RawEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, entity_type, org_id, source_interview_id, name, description,
                    attributes, extracted_at
             FROM raw_entities WHERE id = ?1",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    match rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        Some(row) => Ok(Some(row_to_raw_entity(row)?)),
        None => Ok(None),
    }
}

/// Raw entities of a type not yet absorbed into a consolidated entity,
/// ordered by id for deterministic processing.
pub fn load_unconsolidated(
    conn: &Connection,
    entity_type: EntityType,
) -> DistillResult<Vec<RawEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, entity_type, org_id, source_interview_id, name, description,
                    attributes, extracted_at
             FROM raw_entities
             WHERE entity_type = ?1 AND consolidated_into IS NULL
             ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![entity_type.as_str()])
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        results.push(row_to_raw_entity(row)?);
    }
    Ok(results)
}

/// Mark members as absorbed into a consolidated entity.
pub fn mark_consolidated(
    conn: &Connection,
    member_ids: &[String],
    consolidated_id: &str,
) -> DistillResult<()> {
    for id in member_ids {
        conn.execute(
            "UPDATE raw_entities SET consolidated_into = ?2 WHERE id = ?1",
            params![id, consolidated_id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Restore a raw entity verbatim from a snapshot payload: the row is
/// rewritten and its consolidated-into marker cleared.
pub fn restore_raw(conn: &Connection, entity: &RawEntity) -> DistillResult<()> {
    let attributes_json =
        serde_json::to_string(&entity.attributes).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO raw_entities (
            id, entity_type, org_id, source_interview_id, name, description,
            attributes, extracted_at, consolidated_into
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
        params![
            entity.id,
            entity.entity_type.as_str(),
            entity.org_id,
            entity.source_interview_id,
            entity.name,
            entity.description,
            attributes_json,
            entity.extracted_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Parse a row from the raw_entities table into a RawEntity.
pub(crate) fn row_to_raw_entity(row: &rusqlite::Row<'_>) -> DistillResult<RawEntity> {
    let entity_type_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let attributes_json: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;
    let extracted_at_str: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;

    let entity_type: EntityType = entity_type_str
        .parse()
        .map_err(|e: String| to_storage_err(format!("parse entity_type: {e}")))?;
    let attributes: TypedAttributes = serde_json::from_str(&attributes_json)
        .map_err(|e| to_storage_err(format!("parse attributes: {e}")))?;

    Ok(RawEntity {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        entity_type,
        org_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        source_interview_id: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        name: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        description: row.get(5).map_err(|e| to_storage_err(e.to_string()))?,
        attributes,
        extracted_at: parse_dt(&extracted_at_str)?,
    })
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_dt(s: &str) -> DistillResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| to_storage_err(format!("parse datetime '{s}': {e}")))
}
