//! Economy operations facade
//!
//! Wires the store, ledger, gate, riddles and hint escrow together and exposes
//! the six business operations plus the gate, riddle, hint and streak entry
//! points. Each operation is one write transaction.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use tracing::info;

use crate::children::ChildRepository;
use crate::clock::{Clock, SystemClock, format_day};
use crate::config::Config;
use crate::db::EconomyDb;
use crate::domain::{EntryKind, PenaltyOutcome, PiggyKind};
use crate::error::{EconomyError, EconomyResult};
use crate::gate::ParentalGate;
use crate::hint::{HintEscrow, HintReceipt};
use crate::ledger::{self, LedgerStore};
use crate::riddle::{self, DailyArtifact, DailyRiddles, RiddleGenerator};
use crate::streak::StreakInfo;

/// Points credited by a correct riddle answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolveOutcome {
    pub points: i64,
    pub balance: i64,
}

#[derive(Clone)]
pub struct Economy {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
    children: ChildRepository,
    ledger: LedgerStore,
    gate: ParentalGate,
    riddles: DailyRiddles,
    hints: HintEscrow,
}

impl Economy {
    /// Open the configured database with the wall clock and configured generator
    pub fn open(config: &Config) -> Result<Self> {
        let db = EconomyDb::open(&config.db_path())?;
        let generator = riddle::generator_from_settings(&config.generator);
        Ok(Self::new(db, Arc::new(SystemClock), generator, config))
    }

    pub fn new(
        db: EconomyDb,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn RiddleGenerator>,
        config: &Config,
    ) -> Self {
        let db = db.with_max_tx_retries(config.economy.max_tx_retries);
        Self {
            children: ChildRepository::new(db.clone(), clock.clone()),
            ledger: LedgerStore::new(db.clone(), clock.clone()),
            gate: ParentalGate::new(db.clone(), clock.clone(), config.gate.clone()),
            riddles: DailyRiddles::new(
                db.clone(),
                clock.clone(),
                generator,
                config.generator.clone(),
            ),
            hints: HintEscrow::new(db.clone(), clock.clone(), config.economy.hint_cost),
            db,
            clock,
        }
    }

    pub fn db(&self) -> &EconomyDb {
        &self.db
    }

    pub fn children(&self) -> &ChildRepository {
        &self.children
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn gate(&self) -> &ParentalGate {
        &self.gate
    }

    pub fn riddles(&self) -> &DailyRiddles {
        &self.riddles
    }

    pub fn hints(&self) -> &HintEscrow {
        &self.hints
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn complete_task(&self, child_id: &str, points: i64, reason: &str) -> EconomyResult<i64> {
        let balance = self.ledger.credit(child_id, points, EntryKind::Task, reason)?;
        info!("[kidbank:economy] {} completed '{}' (+{})", child_id, reason, points);
        Ok(balance)
    }

    /// Claim a reward instance once. The claim record and the debit commit together.
    pub fn claim_reward(&self, child_id: &str, reward_id: &str, cost: i64) -> EconomyResult<i64> {
        let now = self.clock.now_ms();
        let balance = self.db.write_tx(|tx| {
            let claimed = tx
                .query_row(
                    "SELECT 1 FROM reward_claims WHERE reward_id = ?1",
                    params![reward_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if claimed {
                return Err(EconomyError::AlreadyClaimed {
                    reward_id: reward_id.to_string(),
                });
            }

            let balance = ledger::debit_in(
                tx,
                child_id,
                cost,
                EntryKind::RewardClaim,
                &format!("reward {reward_id}"),
                now,
            )?;
            tx.execute(
                "INSERT INTO reward_claims (reward_id, child_id, cost, claimed_at) VALUES (?1, ?2, ?3, ?4)",
                params![reward_id, child_id, cost, now],
            )?;
            Ok(balance)
        })?;

        info!("[kidbank:economy] {} claimed reward {} (-{})", child_id, reward_id, cost);
        Ok(balance)
    }

    /// Deduct points for misbehaviour. Always recorded; never drives the balance negative.
    pub fn apply_penalty(
        &self,
        child_id: &str,
        points: i64,
        reason: &str,
    ) -> EconomyResult<PenaltyOutcome> {
        let now = self.clock.now_ms();
        let outcome = self
            .db
            .write_tx(|tx| ledger::penalize_in(tx, child_id, points, reason, now))?;
        info!(
            "[kidbank:economy] Penalty for {}: requested {}, applied {}",
            child_id, outcome.requested, outcome.applied
        );
        Ok(outcome)
    }

    /// Check an answer and credit the riddle's points on the first correct solve
    pub fn solve_riddle(
        &self,
        child_id: &str,
        day: NaiveDate,
        answer: &str,
    ) -> EconomyResult<SolveOutcome> {
        let day_str = format_day(day);
        let now = self.clock.now_ms();

        let outcome = self.db.write_tx(|tx| {
            let riddle = riddle::load_in(tx, child_id, &day_str)?.ok_or_else(|| {
                EconomyError::NoRiddleForDay {
                    day: day_str.clone(),
                }
            })?;
            if riddle.solved {
                return Err(EconomyError::AlreadySolved);
            }
            if !riddle.matches_answer(answer) {
                return Err(EconomyError::IncorrectAnswer);
            }

            riddle::mark_solved_in(tx, &riddle.id, now)?;
            let balance = ledger::credit_in(
                tx,
                child_id,
                riddle.points,
                EntryKind::RiddleSolve,
                &format!("riddle {day_str}"),
                now,
            )?;
            Ok(SolveOutcome {
                points: riddle.points,
                balance,
            })
        })?;

        info!(
            "[kidbank:economy] {} solved the riddle for {} (+{})",
            child_id, day_str, outcome.points
        );
        Ok(outcome)
    }

    /// Move points through the piggy bank.
    ///
    /// Savings deposits need the guardian's parent code, verified right before
    /// the credit. Spending and donations debit with a funds check.
    pub fn piggy_bank_transaction(
        &self,
        child_id: &str,
        kind: PiggyKind,
        amount: i64,
        parent_code: Option<&str>,
    ) -> EconomyResult<i64> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount(amount));
        }
        let reason = format!("piggy bank {}", kind.as_str());

        let balance = if kind.requires_gate() {
            let code = parent_code
                .filter(|c| !c.is_empty())
                .ok_or(EconomyError::ParentCodeRequired)?;
            let child = self.children.get(child_id)?;
            self.gate.verify(&child.guardian_id, code)?;
            self.ledger.credit(child_id, amount, kind.entry_kind(), &reason)?
        } else {
            self.ledger.debit(child_id, amount, kind.entry_kind(), &reason)?
        };

        info!(
            "[kidbank:economy] {} piggy bank {} of {}",
            child_id,
            kind.as_str(),
            amount
        );
        Ok(balance)
    }

    pub fn shop_purchase(&self, child_id: &str, item: &str, price: i64) -> EconomyResult<i64> {
        let balance = self.ledger.debit(
            child_id,
            price,
            EntryKind::ShopPurchase,
            &format!("shop: {item}"),
        )?;
        info!("[kidbank:economy] {} bought '{}' (-{})", child_id, item, price);
        Ok(balance)
    }

    pub fn verify_parent_code(&self, subject_id: &str, code: &str) -> EconomyResult<()> {
        self.gate.verify(subject_id, code)
    }

    /// Today's riddle, generated on first request
    pub async fn daily_riddle(&self, child_id: &str) -> EconomyResult<DailyArtifact> {
        self.riddles.today(child_id).await
    }

    pub fn purchase_hint(&self, child_id: &str, day: NaiveDate) -> EconomyResult<HintReceipt> {
        self.hints.purchase_hint(child_id, day)
    }

    pub fn current_streak(&self, child_id: &str) -> EconomyResult<u32> {
        Ok(self.streak_info(child_id)?.current)
    }

    pub fn streak_info(&self, child_id: &str) -> EconomyResult<StreakInfo> {
        let days = self.ledger.completion_days(child_id)?;
        Ok(StreakInfo::from_days(&days))
    }
}
