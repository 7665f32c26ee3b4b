//! Pattern CRUD. Patterns are derived and regenerable.

use rusqlite::{params, Connection};

use distill_core::errors::DistillResult;
use distill_core::models::{Pattern, PatternType};

use crate::to_storage_err;

/// Insert one pattern. Callers scope the transaction.
pub fn insert_pattern(conn: &Connection, pattern: &Pattern) -> DistillResult<()> {
    let supporting_json = serde_json::to_string(&pattern.supporting_entity_ids)
        .map_err(|e| to_storage_err(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO patterns
            (id, pattern_type, name, org_id, supporting_ids, frequency,
             strength, high_priority, audit_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            pattern.id,
            pattern.pattern_type.as_str(),
            pattern.name,
            pattern.org_id,
            supporting_json,
            pattern.frequency,
            pattern.strength,
            pattern.high_priority as i32,
            pattern.audit_id,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Patterns recognized by one run.
pub fn patterns_for_run(conn: &Connection, audit_id: &str) -> DistillResult<Vec<Pattern>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, pattern_type, name, org_id, supporting_ids, frequency,
                    strength, high_priority, audit_id
             FROM patterns WHERE audit_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut rows = stmt
        .query(params![audit_id])
        .map_err(|e| to_storage_err(e.to_string()))?;
    let mut results = Vec::new();
    while let Some(row) = rows.next().map_err(|e| to_storage_err(e.to_string()))? {
        let pattern_type_str: String = row.get(1).map_err(|e| to_storage_err(e.to_string()))?;
        let supporting_json: String = row.get(4).map_err(|e| to_storage_err(e.to_string()))?;

        let pattern_type: PatternType = serde_json::from_str(&format!("\"{pattern_type_str}\""))
            .map_err(|e| to_storage_err(format!("parse pattern type: {e}")))?;
        let supporting_entity_ids: Vec<String> = serde_json::from_str(&supporting_json)
            .map_err(|e| to_storage_err(format!("parse supporting ids: {e}")))?;

        results.push(Pattern {
            id: row.get(0).map_err(|e| to_storage_err(e.to_string()))?,
            pattern_type,
            name: row.get(2).map_err(|e| to_storage_err(e.to_string()))?,
            org_id: row.get(3).map_err(|e| to_storage_err(e.to_string()))?,
            supporting_entity_ids,
            frequency: row
                .get::<_, i64>(5)
                .map_err(|e| to_storage_err(e.to_string()))? as usize,
            strength: row.get(6).map_err(|e| to_storage_err(e.to_string()))?,
            high_priority: row
                .get::<_, i32>(7)
                .map_err(|e| to_storage_err(e.to_string()))?
                != 0,
            audit_id: row.get(8).map_err(|e| to_storage_err(e.to_string()))?,
        });
    }
    Ok(results)
}

/// Delete a run's patterns. Returns the number removed.
pub fn delete_for_run(conn: &Connection, audit_id: &str) -> DistillResult<usize> {
    conn.execute("DELETE FROM patterns WHERE audit_id = ?1", params![audit_id])
        .map_err(|e| to_storage_err(e.to_string()))
}
