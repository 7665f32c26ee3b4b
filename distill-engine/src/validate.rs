//! Post-run invariant validation. Violations are surfaced, never
//! auto-corrected.

use std::collections::BTreeMap;
use std::sync::Arc;

use distill_core::entity::ConsolidatedEntity;
use distill_core::errors::DistillResult;
use distill_core::models::RunStatus;
use distill_core::traits::EntityStore;

/// One invariant check's outcome.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Pass/fail per check over current store state.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Human-readable lines for failing checks.
    pub fn failures(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| format!("{}: {}", c.name, c.detail))
            .collect()
    }
}

/// Re-check the engine's invariants against current state, optionally scoped
/// to one run.
pub fn validate_store(
    store: &Arc<dyn EntityStore>,
    audit_id: Option<&str>,
) -> DistillResult<ValidationReport> {
    let entities = match audit_id {
        Some(id) => store.consolidated_for_run(id)?,
        None => store.all_consolidated()?,
    };
    let relationships = match audit_id {
        Some(id) => store.relationships_for_run(id)?,
        None => store.all_relationships()?,
    };
    // Org lookup must span the whole store: a run's edges may touch entities
    // merged by earlier runs.
    let all_entities = store.all_consolidated()?;

    let mut checks = Vec::new();
    checks.push(check_source_accounting(&entities));
    checks.push(check_confidence_bounds(&entities));
    checks.extend(check_relationships(&relationships, &all_entities));
    if let Some(id) = audit_id {
        checks.push(check_rolled_back_is_empty(store, id)?);
    }

    Ok(ValidationReport { checks })
}

/// source_count == |mentioned_in_interviews| and >= 1 for every entity.
fn check_source_accounting(entities: &[ConsolidatedEntity]) -> CheckResult {
    let violations: Vec<&str> = entities
        .iter()
        .filter(|e| !e.source_accounting_ok())
        .map(|e| e.id.as_str())
        .collect();
    CheckResult {
        name: "source_accounting".to_string(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("{} entities consistent", entities.len())
        } else {
            format!("violated by: {}", violations.join(", "))
        },
    }
}

/// 0 <= consensus_confidence <= 1 for every entity.
fn check_confidence_bounds(entities: &[ConsolidatedEntity]) -> CheckResult {
    let violations: Vec<&str> = entities
        .iter()
        .filter(|e| {
            let v = e.consensus_confidence.value();
            !(0.0..=1.0).contains(&v) || v.is_nan()
        })
        .map(|e| e.id.as_str())
        .collect();
    CheckResult {
        name: "confidence_bounds".to_string(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            "all confidences in [0, 1]".to_string()
        } else {
            format!("out of bounds: {}", violations.join(", "))
        },
    }
}

/// No relationship crosses org_id; no relationship dangles.
fn check_relationships(
    relationships: &[distill_core::models::Relationship],
    entities: &[ConsolidatedEntity],
) -> Vec<CheckResult> {
    let orgs: BTreeMap<&str, &str> = entities
        .iter()
        .map(|e| (e.id.as_str(), e.org_id.as_str()))
        .collect();

    let mut cross_org = Vec::new();
    let mut orphaned = Vec::new();
    for edge in relationships {
        match (
            orgs.get(edge.source_id.as_str()),
            orgs.get(edge.target_id.as_str()),
        ) {
            (Some(a), Some(b)) if a != b => cross_org.push(edge.id.as_str()),
            (None, _) | (_, None) => orphaned.push(edge.id.as_str()),
            _ => {}
        }
    }

    vec![
        CheckResult {
            name: "namespace_isolation".to_string(),
            passed: cross_org.is_empty(),
            detail: if cross_org.is_empty() {
                format!("{} relationships org-consistent", relationships.len())
            } else {
                format!("cross-org edges: {}", cross_org.join(", "))
            },
        },
        CheckResult {
            name: "no_orphaned_relationships".to_string(),
            passed: orphaned.is_empty(),
            detail: if orphaned.is_empty() {
                "all endpoints resolve".to_string()
            } else {
                format!("dangling edges: {}", orphaned.join(", "))
            },
        },
    ]
}

/// A rolled-back run must have no surviving consolidated output.
fn check_rolled_back_is_empty(
    store: &Arc<dyn EntityStore>,
    audit_id: &str,
) -> DistillResult<CheckResult> {
    let Some(record) = store.get_audit(audit_id)? else {
        return Ok(CheckResult {
            name: "rolled_back_is_empty".to_string(),
            passed: false,
            detail: format!("unknown audit id {audit_id}"),
        });
    };
    if record.status != RunStatus::RolledBack {
        return Ok(CheckResult {
            name: "rolled_back_is_empty".to_string(),
            passed: true,
            detail: "run not rolled back, check not applicable".to_string(),
        });
    }
    let leftover = store.consolidated_for_run(audit_id)?.len();
    Ok(CheckResult {
        name: "rolled_back_is_empty".to_string(),
        passed: leftover == 0,
        detail: if leftover == 0 {
            "no surviving consolidated entities".to_string()
        } else {
            format!("{leftover} consolidated entities survive the rollback")
        },
    })
}
