//! Ledger store - balances and the append-only history of point deltas
//!
//! Every mutation reads the balance, checks it, writes the new balance and
//! appends the history row on the same connection inside one write
//! transaction. The `*_in` functions take that transaction so higher-level
//! operations can couple a ledger mutation with their own side effect.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::clock::{Clock, day_bucket};
use crate::db::EconomyDb;
use crate::domain::{EntryKind, LedgerAudit, LedgerEntry, PenaltyOutcome};
use crate::error::{EconomyError, EconomyResult};

/// Records point movements against child balances
#[derive(Clone)]
pub struct LedgerStore {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
}

impl LedgerStore {
    pub fn new(db: EconomyDb, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Add `amount` points. Returns the new balance.
    pub fn credit(
        &self,
        child_id: &str,
        amount: i64,
        kind: EntryKind,
        reason: &str,
    ) -> EconomyResult<i64> {
        let now = self.clock.now_ms();
        self.db
            .write_tx(|tx| credit_in(tx, child_id, amount, kind, reason, now))
    }

    /// Remove `amount` points, failing with `InsufficientFunds` (and writing
    /// nothing) when the balance is too low. Returns the new balance.
    pub fn debit(
        &self,
        child_id: &str,
        amount: i64,
        kind: EntryKind,
        reason: &str,
    ) -> EconomyResult<i64> {
        let now = self.clock.now_ms();
        self.db
            .write_tx(|tx| debit_in(tx, child_id, amount, kind, reason, now))
    }

    /// Current balance (display read, no lock)
    pub fn balance(&self, child_id: &str) -> EconomyResult<i64> {
        let conn = self.db.conn();
        balance_in(&conn, child_id)
    }

    /// Most recent entries first
    pub fn history(&self, child_id: &str, limit: usize) -> EconomyResult<Vec<LedgerEntry>> {
        let conn = self.db.conn();
        // Surface unknown children instead of an empty list
        balance_in(&conn, child_id)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, child_id, delta, kind, reason, created_at, day_bucket
            FROM ledger_entries WHERE child_id = ?1
            ORDER BY id DESC LIMIT ?2
            "#,
        )?;
        let entries = stmt
            .query_map(params![child_id, limit as i64], |row| {
                Ok(LedgerEntry {
                    id: row.get(0)?,
                    child_id: row.get(1)?,
                    delta: row.get(2)?,
                    kind: parse_kind(&row.get::<_, String>(3)?)?,
                    reason: row.get(4)?,
                    created_at: row.get(5)?,
                    day: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Check `balance == initial_balance + Σ delta` for one child
    pub fn verify(&self, child_id: &str) -> EconomyResult<LedgerAudit> {
        let conn = self.db.conn();
        let row = conn
            .query_row(
                r#"
                SELECT c.initial_balance, c.balance,
                       COALESCE(SUM(l.delta), 0), COUNT(l.id)
                FROM children c LEFT JOIN ledger_entries l ON l.child_id = c.id
                WHERE c.id = ?1
                GROUP BY c.id
                "#,
                params![child_id],
                |r| {
                    Ok(LedgerAudit {
                        initial_balance: r.get(0)?,
                        balance: r.get(1)?,
                        sum_of_deltas: r.get(2)?,
                        entries: r.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()?;
        row.ok_or_else(|| EconomyError::ChildNotFound(child_id.to_string()))
    }

    /// Distinct days with at least one task completion, most recent first
    pub fn completion_days(&self, child_id: &str) -> EconomyResult<Vec<NaiveDate>> {
        let conn = self.db.conn();
        balance_in(&conn, child_id)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT day_bucket FROM ledger_entries
            WHERE child_id = ?1 AND kind = ?2
            ORDER BY day_bucket DESC
            "#,
        )?;
        let days = stmt
            .query_map(params![child_id, EntryKind::Task.as_str()], |row| {
                let day: String = row.get(0)?;
                NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }
}

/// Balance inside the caller's transaction
pub(crate) fn balance_in(conn: &Connection, child_id: &str) -> EconomyResult<i64> {
    conn.query_row(
        "SELECT balance FROM children WHERE id = ?1",
        params![child_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| EconomyError::ChildNotFound(child_id.to_string()))
}

pub(crate) fn credit_in(
    conn: &Connection,
    child_id: &str,
    amount: i64,
    kind: EntryKind,
    reason: &str,
    now_ms: i64,
) -> EconomyResult<i64> {
    ensure_positive(amount)?;
    let balance = balance_in(conn, child_id)?;
    append_entry(conn, child_id, balance, amount, kind, reason, now_ms)
}

pub(crate) fn debit_in(
    conn: &Connection,
    child_id: &str,
    amount: i64,
    kind: EntryKind,
    reason: &str,
    now_ms: i64,
) -> EconomyResult<i64> {
    ensure_positive(amount)?;
    let balance = balance_in(conn, child_id)?;
    if balance < amount {
        return Err(EconomyError::InsufficientFunds {
            balance,
            required: amount,
        });
    }
    append_entry(conn, child_id, balance, -amount, kind, reason, now_ms)
}

/// Penalties are always recorded but never push the balance below zero.
pub(crate) fn penalize_in(
    conn: &Connection,
    child_id: &str,
    points: i64,
    reason: &str,
    now_ms: i64,
) -> EconomyResult<PenaltyOutcome> {
    ensure_positive(points)?;
    let balance = balance_in(conn, child_id)?;
    let applied = points.min(balance);

    let reason = if applied < points {
        format!("{reason} (requested {points}, capped at balance)")
    } else {
        reason.to_string()
    };
    let balance = append_entry(conn, child_id, balance, -applied, EntryKind::Penalty, &reason, now_ms)?;

    Ok(PenaltyOutcome {
        requested: points,
        applied,
        balance,
    })
}

fn append_entry(
    conn: &Connection,
    child_id: &str,
    balance: i64,
    delta: i64,
    kind: EntryKind,
    reason: &str,
    now_ms: i64,
) -> EconomyResult<i64> {
    let new_balance = balance
        .checked_add(delta)
        .ok_or(EconomyError::InvalidAmount(delta))?;

    conn.execute(
        "UPDATE children SET balance = ?1 WHERE id = ?2",
        params![new_balance, child_id],
    )?;
    conn.execute(
        r#"INSERT INTO ledger_entries (child_id, delta, kind, reason, created_at, day_bucket)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        params![child_id, delta, kind.as_str(), reason, now_ms, day_bucket(now_ms)],
    )?;

    debug!(
        "[kidbank:ledger] {} {:+} ({}) -> {}",
        child_id, delta, kind, new_balance
    );
    Ok(new_balance)
}

fn ensure_positive(amount: i64) -> EconomyResult<()> {
    if amount <= 0 {
        return Err(EconomyError::InvalidAmount(amount));
    }
    Ok(())
}

fn parse_kind(s: &str) -> rusqlite::Result<EntryKind> {
    EntryKind::from_str(s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown ledger entry kind: {s}").into(),
        )
    })
}
