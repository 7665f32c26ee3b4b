//! Relationship CRUD. Edges are derived and regenerable; refresh is
//! delete-then-insert per run.

use rusqlite::{params, Connection};

use distill_core::errors::DistillResult;
use distill_core::models::{InferenceRule, Relationship, RelationshipType};

use crate::to_storage_err;

/// Insert one relationship edge. Callers scope the transaction.
pub fn insert_relationship(conn: &Connection, edge: &Relationship) -> DistillResult<()> {
    let rel_type_json = serde_json::to_string(&edge.relationship_type)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rule_json =
        serde_json::to_string(&edge.rule).map_err(|e| to_storage_err(e.to_string()))?;
    let evidence_json =
        serde_json::to_string(&edge.evidence).map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO relationships
            (id, source_id, target_id, relationship_type, confidence, rule, evidence, audit_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            edge.id,
            edge.source_id,
            edge.target_id,
            rel_type_json.trim_matches('"'),
            edge.confidence,
            rule_json.trim_matches('"'),
            evidence_json,
            edge.audit_id,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Relationships discovered by one run.
pub fn relationships_for_run(conn: &Connection, audit_id: &str) -> DistillResult<Vec<Relationship>> {
    query_many(
        conn,
        &format!("{SELECT_COLUMNS} WHERE audit_id = ?1 ORDER BY id"),
        params![audit_id],
    )
}

/// All relationships in the store.
pub fn all_relationships(conn: &Connection) -> DistillResult<Vec<Relationship>> {
    query_many(conn, &format!("{SELECT_COLUMNS} ORDER BY id"), params![])
}

/// Delete a run's relationships. Returns the number removed.
pub fn delete_for_run(conn: &Connection, audit_id: &str) -> DistillResult<usize> {
    conn.execute(
        "DELETE FROM relationships WHERE audit_id = ?1",
        params![audit_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

const SELECT_COLUMNS: &str = "SELECT id, source_id, target_id, relationship_type, confidence,
        rule, evidence, audit_id
 FROM relationships";

fn query_many(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> DistillResult<Vec<Relationship>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;
    let mut rows = stmt.query(params).map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        let rel_type_str: String = row.get(3).map_err(|e| to_storage_err(e.to_string()))?;
        let rule_str: String = row.get(5).map_err(|e| to_storage_err(e.to_string()))?;
        let evidence_json: String = row.get(6).map_err(|e| to_storage_err(e.to_string()))?;

        let relationship_type: RelationshipType =
            serde_json::from_str(&format!("\"{rel_type_str}\""))
                .map_err(|e| to_storage_err(format!("parse relationship type: {e}")))?;
        let rule: InferenceRule = serde_json::from_str(&format!("\"{rule_str}\""))
            .map_err(|e| to_storage_err(format!("parse inference rule: {e}")))?;
        let evidence: Vec<String> = serde_json::from_str(&evidence_json)
            .map_err(|e| to_storage_err(format!("parse evidence: {e}")))?;

        results.push(Relationship {
            id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
            source_id: row.get(1).map_err(|e| to_storage_err(e.to_string()))?,
            target_id: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
            relationship_type,
            confidence: row.get(4).map_err(|e| to_storage_err(e.to_string()))?,
            rule,
            evidence,
            audit_id: row.get(7).map_err(|e| to_storage_err(e.to_string()))?,
        });
    }
    Ok(results)
}
