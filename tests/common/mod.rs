//! Shared test utilities for economy integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use kidbank::NewChild;
use kidbank::clock::ManualClock;
use kidbank::config::Config;
use kidbank::db::EconomyDb;
use kidbank::economy::Economy;
use kidbank::riddle::{RiddleBank, RiddleGenerator};

pub const GUARDIAN: &str = "g1";
pub const CHILD: &str = "c1";

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// An on-disk economy database that several handles ("devices") can open
pub struct SharedStore {
    _dir: TempDir,
    pub path: PathBuf,
    pub clock: Arc<ManualClock>,
}

impl SharedStore {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("economy.db");
        Self {
            _dir: dir,
            path,
            clock: Arc::new(ManualClock::at_day(day(2024, 3, 1))),
        }
    }

    /// Open an independent connection with the built-in riddle bank
    pub fn open(&self) -> Economy {
        self.open_with(Arc::new(RiddleBank::new()))
    }

    pub fn open_with(&self, generator: Arc<dyn RiddleGenerator>) -> Economy {
        open_at(&self.path, self.clock.clone(), generator)
    }
}

pub fn open_at(
    path: &Path,
    clock: Arc<ManualClock>,
    generator: Arc<dyn RiddleGenerator>,
) -> Economy {
    let db = EconomyDb::open(path).expect("Failed to open economy db");
    Economy::new(db, clock, generator, &Config::default())
}

/// Onboard the standard test child with a starting balance and age 9
pub fn add_child(economy: &Economy, balance: i64) {
    economy
        .children()
        .create(
            NewChild::new(GUARDIAN, "Ada")
                .with_id(CHILD)
                .with_age(9)
                .with_balance(balance),
        )
        .expect("Failed to create child");
}
