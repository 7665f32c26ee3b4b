//! Insert and query operations for consolidated entities.

use std::collections::BTreeSet;

use rusqlite::{params, Connection};

use distill_core::entity::{Confidence, ConsolidatedEntity, EntityType, TypedAttributes};
use distill_core::errors::DistillResult;

use super::raw_ops::parse_dt;
use crate::to_storage_err;

/// Insert a consolidated entity. Callers scope the transaction.
pub fn insert_consolidated(conn: &Connection, entity: &ConsolidatedEntity) -> DistillResult<()> {
    let mentioned_json = serde_json::to_string(&entity.mentioned_in_interviews)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let contradicting_json = serde_json::to_string(&entity.contradicting_sources)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let attributes_json =
        serde_json::to_string(&entity.attributes).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT INTO consolidated_entities (
            id, entity_type, org_id, name, description, attributes, source_count,
            mentioned_in, consensus_confidence, contradiction,
            contradicting_sources, audit_id, consolidated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entity.id,
            entity.entity_type.as_str(),
            entity.org_id,
            entity.name,
            entity.description,
            attributes_json,
            entity.source_count,
            mentioned_json,
            entity.consensus_confidence.value(),
            entity.contradiction_flag as i32,
            contradicting_json,
            entity.audit_id,
            entity.consolidated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Get a single consolidated entity by id.
pub fn get_consolidated(conn: &Connection, id: &str) -> DistillResult<Option<ConsolidatedEntity>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    match rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        Some(row) => Ok(Some(row_to_consolidated(row)?)),
        None => Ok(None),
    }
}

/// All consolidated entities, ordered by id.
pub fn all_consolidated(conn: &Connection) -> DistillResult<Vec<ConsolidatedEntity>> {
    query_many(conn, &format!("{SELECT_COLUMNS} ORDER BY id"), params![])
}

/// Consolidated entities produced by one run.
pub fn consolidated_for_run(
    conn: &Connection,
    audit_id: &str,
) -> DistillResult<Vec<ConsolidatedEntity>> {
    query_many(
        conn,
        &format!("{SELECT_COLUMNS} WHERE audit_id = ?1 ORDER BY id"),
        params![audit_id],
    )
}

/// Delete a run's consolidated entities. Returns the number removed.
pub fn delete_for_run(conn: &Connection, audit_id: &str) -> DistillResult<usize> {
    conn.execute(
        "DELETE FROM consolidated_entities WHERE audit_id = ?1",
        params![audit_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

const SELECT_COLUMNS: &str = "SELECT id, entity_type, org_id, name, description, attributes,
        source_count, mentioned_in, consensus_confidence, contradiction,
        contradicting_sources, audit_id, consolidated_at
 FROM consolidated_entities";

fn query_many(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DistillResult<Vec<ConsolidatedEntity>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let mut rows = stmt.query(params).map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        results.push(row_to_consolidated(row)?);
    }
    Ok(results)
}

/// Parse a row from the consolidated_entities table.
fn row_to_consolidated(row: &rusqlite::Row<'_>) -> DistillResult<ConsolidatedEntity> {
    let entity_type_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
    let attributes_json: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
    let mentioned_json: String = row.get(7).map_err(|e| to_storage_err(e.to_string()))?;
    let contradicting_json: String = row.get(10).map_err(|e| to_storage_err(e.to_string()))?;
    let consolidated_at_str: String = row.get(12).map_err(|e| to_storage_err(e.to_string()))?;

    let entity_type: EntityType = entity_type_str
        .parse()
        .map_err(|e: String| to_storage_err(format!("parse entity_type: {e}")))?;
    let attributes: TypedAttributes = serde_json::from_str(&attributes_json)
        .map_err(|e| to_storage_err(format!("parse attributes: {e}")))?;
    let mentioned_in_interviews: BTreeSet<String> = serde_json::from_str(&mentioned_json)
        .map_err(|e| to_storage_err(format!("parse mentioned_in: {e}")))?;
    let contradicting_sources: Vec<String> = serde_json::from_str(&contradicting_json)
        .map_err(|e| to_storage_err(format!("parse contradicting_sources: {e}")))?;

    Ok(ConsolidatedEntity {
        id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
        entity_type,
        org_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
        name: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
        description: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
        attributes,
        source_count: row
            .get::<_, i64>(6)
            .map_err(|e| to_storage_err(e.to_string()))? as usize,
        mentioned_in_interviews,
        consensus_confidence: Confidence::new(
            row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        ),
        contradiction_flag: row
            .get::<_, i32>(9)
            .map_err(|e| to_storage_err(e.to_string()))?
            != 0,
        contradicting_sources,
        audit_id: row.get(11).map_err(|e| to_storage_err(e.to_string()))?,
        consolidated_at: parse_dt(&consolidated_at_str)?,
    })
}
