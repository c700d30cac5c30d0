//! Parental gate: secret-code verification with a persisted lockout
//!
//! State machine per subject (guardian):
//!
//! ```text
//!  Unlocked --fail, count < max--> Unlocked   (count += 1)
//!  Unlocked --fail, count == max-> Locked     (lockout_until = now + duration)
//!  Locked   --attempt, now < until-> Locked   (rejected, code not checked)
//!  Locked   --attempt, now >= until> Unlocked (count reset, then evaluated)
//!  Unlocked --success------------> Unlocked   (count = 0)
//! ```
//!
//! Transitions are evaluated lazily on each access; there is no timer. Each
//! attempt runs in one write transaction so parallel guesses cannot slip past
//! the counter, and every attempt appends an audit entry.

mod audit;
mod code;

pub use audit::{AuditLogEntry, AuditOutcome};
pub use code::{hash_code, validate_code, verify_code};

use std::sync::Arc;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::GateSettings;
use crate::db::EconomyDb;
use crate::error::{EconomyError, EconomyResult};

/// Persisted gate row
#[derive(Debug, Clone, PartialEq, Eq)]
struct GateState {
    code_hash: String,
    failed_attempts: u32,
    lockout_until: Option<i64>,
}

/// Snapshot for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateStatus {
    pub configured: bool,
    pub failed_attempts: u32,
    /// Time left in the lockout window, if locked
    pub locked_for: Option<Duration>,
}

/// Outcome decided inside the transaction; converted to a result after commit
enum Verdict {
    Accepted,
    Rejected { attempts_remaining: u32 },
    Locked { remaining_ms: i64 },
    NotConfigured,
}

/// Rate-limited parent code checkpoint
#[derive(Clone)]
pub struct ParentalGate {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
    settings: GateSettings,
}

impl ParentalGate {
    pub fn new(db: EconomyDb, clock: Arc<dyn Clock>, settings: GateSettings) -> Self {
        Self {
            db,
            clock,
            settings,
        }
    }

    /// Store a new code for `subject_id`, clearing any counter or lockout
    pub fn set_code(&self, subject_id: &str, code: &str) -> EconomyResult<()> {
        validate_code(code)?;
        let hash = hash_code(code)?;
        let now = self.clock.now_ms();

        self.db.write_tx(|tx| {
            tx.execute(
                r#"INSERT INTO gate_state (subject_id, code_hash, failed_attempts, lockout_until, updated_at)
                   VALUES (?1, ?2, 0, NULL, ?3)
                   ON CONFLICT(subject_id) DO UPDATE SET
                       code_hash = ?2, failed_attempts = 0, lockout_until = NULL, updated_at = ?3"#,
                params![subject_id, hash, now],
            )?;
            Ok(())
        })?;

        info!("[kidbank:gate] Parent code set for {}", subject_id);
        Ok(())
    }

    /// Replace the code after proving knowledge of the current one
    pub fn change_code(&self, subject_id: &str, current: &str, new_code: &str) -> EconomyResult<()> {
        validate_code(new_code)?;
        self.verify(subject_id, current)?;
        self.set_code(subject_id, new_code)
    }

    /// Verify a code attempt.
    ///
    /// Returns `LockedOut` while the lockout window is open (without checking
    /// the code), `InvalidCode` on a mismatch, and `LockedOut` on the mismatch
    /// that exhausts the attempt budget. A subject with no code gets
    /// `GateNotConfigured`; every one of these outcomes is audited.
    pub fn verify(&self, subject_id: &str, code: &str) -> EconomyResult<()> {
        let now = self.clock.now_ms();
        let max_attempts = self.settings.max_attempts.max(1);
        let lockout_ms = self.settings.lockout_duration().as_millis() as i64;

        let verdict = self.db.write_tx(|tx| {
            verify_in(tx, subject_id, code, now, max_attempts, lockout_ms)
        })?;

        match verdict {
            Verdict::Accepted => {
                info!("[kidbank:gate] Verified {}", subject_id);
                Ok(())
            }
            Verdict::Rejected { attempts_remaining } => {
                warn!(
                    "[kidbank:gate] Wrong code for {} ({} attempts remaining)",
                    subject_id, attempts_remaining
                );
                Err(EconomyError::InvalidCode { attempts_remaining })
            }
            Verdict::Locked { remaining_ms } => {
                warn!(
                    "[kidbank:gate] {} locked out for another {}ms",
                    subject_id, remaining_ms
                );
                Err(EconomyError::LockedOut {
                    remaining: Duration::from_millis(remaining_ms.max(0) as u64),
                })
            }
            Verdict::NotConfigured => {
                warn!("[kidbank:gate] No parent code set for {}", subject_id);
                Err(EconomyError::GateNotConfigured(subject_id.to_string()))
            }
        }
    }

    /// Current state, with an expired lockout reported as unlocked
    pub fn status(&self, subject_id: &str) -> EconomyResult<GateStatus> {
        let now = self.clock.now_ms();
        let conn = self.db.conn();
        let Some(state) = load_state(&conn, subject_id)? else {
            return Ok(GateStatus {
                configured: false,
                failed_attempts: 0,
                locked_for: None,
            });
        };

        let status = match state.lockout_until {
            Some(until) if now < until => GateStatus {
                configured: true,
                failed_attempts: state.failed_attempts,
                locked_for: Some(Duration::from_millis((until - now) as u64)),
            },
            Some(_) => GateStatus {
                configured: true,
                failed_attempts: 0,
                locked_for: None,
            },
            None => GateStatus {
                configured: true,
                failed_attempts: state.failed_attempts,
                locked_for: None,
            },
        };
        Ok(status)
    }

    /// Recent verification attempts, newest first
    pub fn audit_log(&self, subject_id: &str, limit: usize) -> EconomyResult<Vec<AuditLogEntry>> {
        let conn = self.db.conn();
        audit::list(&conn, subject_id, limit)
    }
}

fn verify_in(
    conn: &Connection,
    subject_id: &str,
    code: &str,
    now: i64,
    max_attempts: u32,
    lockout_ms: i64,
) -> EconomyResult<Verdict> {
    let Some(mut state) = load_state(conn, subject_id)? else {
        audit::record(conn, subject_id, AuditOutcome::Failure, now)?;
        return Ok(Verdict::NotConfigured);
    };

    if let Some(until) = state.lockout_until {
        if now < until {
            audit::record(conn, subject_id, AuditOutcome::Failure, now)?;
            return Ok(Verdict::Locked {
                remaining_ms: until - now,
            });
        }
        // Window elapsed: back to a clean Unlocked state
        state.failed_attempts = 0;
        state.lockout_until = None;
    }

    if verify_code(code, &state.code_hash)? {
        save_counters(conn, subject_id, 0, None, now)?;
        audit::record(conn, subject_id, AuditOutcome::Success, now)?;
        return Ok(Verdict::Accepted);
    }

    let failed = state.failed_attempts + 1;
    audit::record(conn, subject_id, AuditOutcome::Failure, now)?;

    if failed >= max_attempts {
        let until = now + lockout_ms;
        save_counters(conn, subject_id, failed, Some(until), now)?;
        Ok(Verdict::Locked {
            remaining_ms: lockout_ms,
        })
    } else {
        save_counters(conn, subject_id, failed, None, now)?;
        Ok(Verdict::Rejected {
            attempts_remaining: max_attempts - failed,
        })
    }
}

fn load_state(conn: &Connection, subject_id: &str) -> EconomyResult<Option<GateState>> {
    let state = conn
        .query_row(
            "SELECT code_hash, failed_attempts, lockout_until FROM gate_state WHERE subject_id = ?1",
            params![subject_id],
            |r| {
                Ok(GateState {
                    code_hash: r.get(0)?,
                    failed_attempts: r.get(1)?,
                    lockout_until: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(state)
}

fn save_counters(
    conn: &Connection,
    subject_id: &str,
    failed_attempts: u32,
    lockout_until: Option<i64>,
    now: i64,
) -> EconomyResult<()> {
    conn.execute(
        r#"UPDATE gate_state SET failed_attempts = ?1, lockout_until = ?2, updated_at = ?3
           WHERE subject_id = ?4"#,
        params![failed_attempts, lockout_until, now, subject_id],
    )?;
    Ok(())
}
