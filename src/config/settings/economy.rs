//! Ledger and hint pricing settings

use serde::{Deserialize, Serialize};

use crate::db::DEFAULT_MAX_TX_RETRIES;

/// Economy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomySettings {
    /// Points charged for revealing the daily riddle's hint
    #[serde(default = "default_hint_cost")]
    pub hint_cost: i64,

    /// Whole-transaction retries when the database stays busy.
    /// After this many attempts the operation fails with a conflict.
    #[serde(default = "default_max_tx_retries")]
    pub max_tx_retries: u32,
}

fn default_hint_cost() -> i64 {
    5
}

fn default_max_tx_retries() -> u32 {
    DEFAULT_MAX_TX_RETRIES
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            hint_cost: default_hint_cost(),
            max_tx_retries: default_max_tx_retries(),
        }
    }
}
