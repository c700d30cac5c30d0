//! Append-only audit trail of gate verification attempts

use rusqlite::{Connection, params};
use serde::Serialize;

use crate::error::EconomyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub subject_id: String,
    pub outcome: AuditOutcome,
    pub created_at: i64,
}

pub(crate) fn record(
    conn: &Connection,
    subject_id: &str,
    outcome: AuditOutcome,
    now_ms: i64,
) -> EconomyResult<()> {
    conn.execute(
        "INSERT INTO gate_audit_log (subject_id, outcome, created_at) VALUES (?1, ?2, ?3)",
        params![subject_id, outcome.as_str(), now_ms],
    )?;
    Ok(())
}

/// Most recent attempts first
pub(crate) fn list(
    conn: &Connection,
    subject_id: &str,
    limit: usize,
) -> EconomyResult<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT subject_id, outcome, created_at FROM gate_audit_log
        WHERE subject_id = ?1 ORDER BY id DESC LIMIT ?2
        "#,
    )?;
    let entries = stmt
        .query_map(params![subject_id, limit as i64], |row| {
            let outcome: String = row.get(1)?;
            Ok(AuditLogEntry {
                subject_id: row.get(0)?,
                outcome: AuditOutcome::from_str(&outcome).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        format!("unknown audit outcome: {outcome}").into(),
                    )
                })?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}
