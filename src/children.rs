//! Child accounts: onboarding, guardian-scoped lookup, deletion

use std::sync::Arc;

use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

use crate::clock::Clock;
use crate::db::EconomyDb;
use crate::domain::{Child, NewChild};
use crate::error::{EconomyError, EconomyResult};

const CHILD_COLUMNS: &str = "id, guardian_id, name, age, initial_balance, balance, created_at";

/// Repository for child accounts
#[derive(Clone)]
pub struct ChildRepository {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
}

impl ChildRepository {
    pub fn new(db: EconomyDb, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Onboard a child with its starting balance
    pub fn create(&self, new: NewChild) -> EconomyResult<Child> {
        if new.initial_balance < 0 {
            return Err(EconomyError::InvalidAmount(new.initial_balance));
        }

        let child = Child {
            id: new
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            guardian_id: new.guardian_id,
            name: new.name,
            age: new.age,
            initial_balance: new.initial_balance,
            balance: new.initial_balance,
            created_at: self.clock.now_ms(),
        };

        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO children (id, guardian_id, name, age, initial_balance, balance, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                child.id,
                child.guardian_id,
                child.name,
                child.age,
                child.initial_balance,
                child.balance,
                child.created_at,
            ],
        )?;

        info!(
            "[kidbank:children] Onboarded {} ({}) for guardian {}",
            child.name, child.id, child.guardian_id
        );
        Ok(child)
    }

    /// Get a child by ID
    pub fn get(&self, id: &str) -> EconomyResult<Child> {
        let conn = self.db.conn();
        conn.query_row(
            &format!("SELECT {CHILD_COLUMNS} FROM children WHERE id = ?1"),
            params![id],
            map_child,
        )
        .optional()?
        .ok_or_else(|| EconomyError::ChildNotFound(id.to_string()))
    }

    /// Get a child only if it belongs to `guardian_id`
    pub fn get_owned(&self, guardian_id: &str, id: &str) -> EconomyResult<Child> {
        let child = self.get(id)?;
        if child.guardian_id != guardian_id {
            // Do not reveal that the child exists under another guardian
            return Err(EconomyError::ChildNotFound(id.to_string()));
        }
        Ok(child)
    }

    /// List a guardian's children, oldest first
    pub fn list_for_guardian(&self, guardian_id: &str) -> EconomyResult<Vec<Child>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CHILD_COLUMNS} FROM children WHERE guardian_id = ?1 ORDER BY created_at, id"
        ))?;
        let children = stmt
            .query_map(params![guardian_id], map_child)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(children)
    }

    /// Delete a child and, by cascade, its ledger history, riddles, hints and claims
    pub fn delete(&self, guardian_id: &str, id: &str) -> EconomyResult<()> {
        let conn = self.db.conn();
        let removed = conn.execute(
            "DELETE FROM children WHERE id = ?1 AND guardian_id = ?2",
            params![id, guardian_id],
        )?;
        if removed == 0 {
            return Err(EconomyError::ChildNotFound(id.to_string()));
        }
        info!("[kidbank:children] Deleted {} for guardian {}", id, guardian_id);
        Ok(())
    }
}

fn map_child(row: &Row<'_>) -> rusqlite::Result<Child> {
    Ok(Child {
        id: row.get(0)?,
        guardian_id: row.get(1)?,
        name: row.get(2)?,
        age: row.get(3)?,
        initial_balance: row.get(4)?,
        balance: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::domain::EntryKind;
    use crate::ledger::LedgerStore;

    fn repo() -> (ChildRepository, EconomyDb) {
        let db = EconomyDb::open_in_memory().unwrap();
        (ChildRepository::new(db.clone(), Arc::new(SystemClock)), db)
    }

    #[test]
    fn test_create_and_get() {
        let (repo, _db) = repo();
        let child = repo
            .create(NewChild::new("g1", "Ada").with_age(8).with_balance(20))
            .unwrap();
        assert!(!child.id.is_empty());

        let loaded = repo.get(&child.id).unwrap();
        assert_eq!(loaded, child);
        assert_eq!(loaded.balance, 20);
        assert_eq!(loaded.age, Some(8));
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let (repo, _db) = repo();
        assert!(matches!(
            repo.create(NewChild::new("g1", "Ada").with_balance(-1)),
            Err(EconomyError::InvalidAmount(-1))
        ));
    }

    #[test]
    fn test_guardian_scoping() {
        let (repo, _db) = repo();
        repo.create(NewChild::new("g1", "Ada").with_id("a")).unwrap();
        repo.create(NewChild::new("g1", "Ben").with_id("b")).unwrap();
        repo.create(NewChild::new("g2", "Cy").with_id("c")).unwrap();

        let names: Vec<_> = repo
            .list_for_guardian("g1")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Ada", "Ben"]);

        assert!(repo.get_owned("g1", "a").is_ok());
        assert!(matches!(
            repo.get_owned("g2", "a"),
            Err(EconomyError::ChildNotFound(_))
        ));
        assert!(matches!(
            repo.delete("g2", "a"),
            Err(EconomyError::ChildNotFound(_))
        ));
    }

    #[test]
    fn test_delete_cascades_history() {
        let (repo, db) = repo();
        repo.create(NewChild::new("g1", "Ada").with_id("a")).unwrap();
        LedgerStore::new(db.clone(), Arc::new(SystemClock))
            .credit("a", 5, EntryKind::Task, "bed")
            .unwrap();

        repo.delete("g1", "a").unwrap();

        let remaining: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM ledger_entries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(repo.get("a"), Err(EconomyError::ChildNotFound(_))));
    }
}
