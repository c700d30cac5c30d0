//! Hint escrow: pay once per day to reveal the daily riddle's hint

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{Clock, format_day};
use crate::db::EconomyDb;
use crate::domain::EntryKind;
use crate::error::{EconomyError, EconomyResult};
use crate::ledger::{balance_in, debit_in};
use crate::riddle;

/// Result of a hint purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HintReceipt {
    pub hint: String,
    /// False when the hint had already been bought today
    pub charged: bool,
    pub balance: i64,
}

#[derive(Clone)]
pub struct HintEscrow {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
    cost: i64,
}

impl HintEscrow {
    /// A configured cost below 1 is raised to 1 point
    pub fn new(db: EconomyDb, clock: Arc<dyn Clock>, cost: i64) -> Self {
        if cost < 1 {
            warn!("[kidbank:hint] hint_cost {} is not positive, using 1", cost);
        }
        Self {
            db,
            clock,
            cost: cost.max(1),
        }
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    /// Reveal the hint for (child, day), charging only on the first call.
    ///
    /// The riddle check, the debit and the purchase record commit together,
    /// so concurrent first purchases debit once.
    pub fn purchase_hint(&self, child_id: &str, day: NaiveDate) -> EconomyResult<HintReceipt> {
        let day_str = format_day(day);
        let now = self.clock.now_ms();
        let cost = self.cost;

        let receipt = self.db.write_tx(|tx| {
            let riddle =
                riddle::load_in(tx, child_id, &day_str)?.ok_or(EconomyError::NoHintContext)?;
            if riddle.solved {
                return Err(EconomyError::AlreadySolved);
            }

            if let Some(hint) = purchased_hint(tx, child_id, &day_str)? {
                return Ok(HintReceipt {
                    hint,
                    charged: false,
                    balance: balance_in(tx, child_id)?,
                });
            }

            let balance = debit_in(
                tx,
                child_id,
                cost,
                EntryKind::HintPurchase,
                &format!("hint for {day_str}"),
                now,
            )?;
            tx.execute(
                r#"INSERT INTO hint_purchases (child_id, day, purchased, revealed_hint, cost, purchased_at)
                   VALUES (?1, ?2, 1, ?3, ?4, ?5)"#,
                params![child_id, day_str, riddle.hint, cost, now],
            )?;
            Ok(HintReceipt {
                hint: riddle.hint,
                charged: true,
                balance,
            })
        })?;

        if receipt.charged {
            info!(
                "[kidbank:hint] {} bought the hint for {} ({} points)",
                child_id, day_str, cost
            );
        }
        Ok(receipt)
    }
}

fn purchased_hint(conn: &Connection, child_id: &str, day: &str) -> EconomyResult<Option<String>> {
    let hint = conn
        .query_row(
            "SELECT revealed_hint FROM hint_purchases WHERE child_id = ?1 AND day = ?2 AND purchased = 1",
            params![child_id, day],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hint)
}
