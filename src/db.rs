//! SQLite database connection and schema management for the economy
//!
//! Manages the `~/.kidbank/economy.db` database with automatic schema migration.
//! Every balance mutation goes through [`EconomyDb::write_tx`], which runs the
//! closure inside a `BEGIN IMMEDIATE` transaction so the balance read and the
//! balance write are serialized across connections and processes.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{EconomyError, EconomyResult};

/// How long a connection waits on another writer before reporting busy
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on whole-transaction retries after a busy error
pub const DEFAULT_MAX_TX_RETRIES: u32 = 5;

/// Database wrapper shared by all economy components
#[derive(Clone)]
pub struct EconomyDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
    max_tx_retries: u32,
}

impl EconomyDb {
    /// Open or create the economy database at the default location (~/.kidbank/economy.db)
    pub fn open_default() -> Result<Self> {
        let db_path = Config::global_config_dir().join("economy.db");
        Self::open(&db_path)
    }

    /// Open or create the economy database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open economy db: {}", path.display()))?;

        // WAL lets display reads proceed while a writer holds the lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            max_tx_retries: DEFAULT_MAX_TX_RETRIES,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Override the retry bound for busy transactions
    pub fn with_max_tx_retries(mut self, retries: u32) -> Self {
        self.max_tx_retries = retries.max(1);
        self
    }

    /// Get a reference to the connection (for display queries)
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Economy DB lock poisoned")
    }

    /// Run `op` inside an IMMEDIATE write transaction.
    ///
    /// The closure may run more than once: if SQLite reports the database as
    /// busy or locked, the transaction is rolled back and retried with
    /// exponential backoff. After `max_tx_retries` attempts the caller gets
    /// [`EconomyError::ConcurrentConflict`]. Domain errors returned by `op`
    /// roll back and are returned as-is.
    pub fn write_tx<T, F>(&self, mut op: F) -> EconomyResult<T>
    where
        F: FnMut(&Transaction<'_>) -> EconomyResult<T>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_write_tx(&mut op) {
                Err(e) if e.is_busy() => {
                    if attempt >= self.max_tx_retries {
                        warn!(
                            "[kidbank:db] Giving up after {} busy attempts: {}",
                            attempt, e
                        );
                        return Err(EconomyError::ConcurrentConflict { attempts: attempt });
                    }
                    // 10ms, 20ms, 40ms, ...
                    let delay = Duration::from_millis(10 * (1 << (attempt - 1).min(6)));
                    debug!(
                        "[kidbank:db] Transaction attempt {}/{} busy, retrying in {:?}",
                        attempt, self.max_tx_retries, delay
                    );
                    std::thread::sleep(delay);
                }
                other => return other,
            }
        }
    }

    fn try_write_tx<T, F>(&self, op: &mut F) -> EconomyResult<T>
    where
        F: FnMut(&Transaction<'_>) -> EconomyResult<T>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Dropping an uncommitted transaction rolls it back
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .context("Failed to read schema version")?;

        // Migration 2: riddles record when they were solved
        if version < 2 {
            let has_solved_at: bool = conn
                .prepare("SELECT COUNT(*) FROM pragma_table_info('daily_riddles') WHERE name = 'solved_at'")
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)?;

            if !has_solved_at {
                conn.execute_batch("ALTER TABLE daily_riddles ADD COLUMN solved_at INTEGER;")?;
            }
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }

    /// Delete all economy data (reset to empty state)
    pub fn reset_all(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(
            r#"
            DELETE FROM hint_purchases;
            DELETE FROM reward_claims;
            DELETE FROM daily_riddles;
            DELETE FROM ledger_entries;
            DELETE FROM children;
            DELETE FROM gate_audit_log;
            DELETE FROM gate_state;
            "#,
        )?;
        Ok(())
    }
}

/// SQL schema for the economy database
const SCHEMA_SQL: &str = r#"
-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);

-- ============================================
-- CHILDREN & LEDGER
-- ============================================

CREATE TABLE IF NOT EXISTS children (
    id TEXT PRIMARY KEY,
    guardian_id TEXT NOT NULL,
    name TEXT NOT NULL,
    age INTEGER,
    initial_balance INTEGER NOT NULL DEFAULT 0 CHECK (initial_balance >= 0),
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_children_guardian ON children(guardian_id);

-- Append-only history of signed point deltas
CREATE TABLE IF NOT EXISTS ledger_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    child_id TEXT NOT NULL REFERENCES children(id) ON DELETE CASCADE,
    delta INTEGER NOT NULL,
    kind TEXT NOT NULL,
    reason TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    day_bucket TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_ledger_child ON ledger_entries(child_id, created_at);
CREATE INDEX IF NOT EXISTS idx_ledger_kind_day ON ledger_entries(child_id, kind, day_bucket);

CREATE TRIGGER IF NOT EXISTS ledger_entries_immutable
BEFORE UPDATE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries are immutable');
END;

-- Reward instances claimed against the ledger
CREATE TABLE IF NOT EXISTS reward_claims (
    reward_id TEXT PRIMARY KEY,
    child_id TEXT NOT NULL REFERENCES children(id) ON DELETE CASCADE,
    cost INTEGER NOT NULL,
    claimed_at INTEGER NOT NULL
);

-- ============================================
-- DAILY RIDDLES & HINTS
-- ============================================

CREATE TABLE IF NOT EXISTS daily_riddles (
    id TEXT PRIMARY KEY,
    child_id TEXT NOT NULL REFERENCES children(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    hint TEXT NOT NULL,
    points INTEGER NOT NULL,
    difficulty TEXT NOT NULL,
    solved INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    UNIQUE (child_id, day)
);

CREATE TABLE IF NOT EXISTS hint_purchases (
    child_id TEXT NOT NULL REFERENCES children(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    purchased INTEGER NOT NULL DEFAULT 1,
    revealed_hint TEXT NOT NULL,
    cost INTEGER NOT NULL,
    purchased_at INTEGER NOT NULL,
    PRIMARY KEY (child_id, day)
);

-- ============================================
-- PARENTAL GATE
-- ============================================

CREATE TABLE IF NOT EXISTS gate_state (
    subject_id TEXT PRIMARY KEY,
    code_hash TEXT NOT NULL,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    lockout_until INTEGER,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS gate_audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id TEXT NOT NULL,
    outcome TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_gate_audit_subject ON gate_audit_log(subject_id, created_at);
"#;
