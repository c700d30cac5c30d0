use serde::{Deserialize, Serialize};

/// Business event that produced a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Task,
    RewardClaim,
    Penalty,
    RiddleSolve,
    PiggySavings,
    PiggySpending,
    PiggyDonation,
    ShopPurchase,
    HintPurchase,
}

impl EntryKind {
    pub const ALL: [EntryKind; 9] = [
        EntryKind::Task,
        EntryKind::RewardClaim,
        EntryKind::Penalty,
        EntryKind::RiddleSolve,
        EntryKind::PiggySavings,
        EntryKind::PiggySpending,
        EntryKind::PiggyDonation,
        EntryKind::ShopPurchase,
        EntryKind::HintPurchase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::RewardClaim => "reward_claim",
            Self::Penalty => "penalty",
            Self::RiddleSolve => "riddle_solve",
            Self::PiggySavings => "piggy_savings",
            Self::PiggySpending => "piggy_spending",
            Self::PiggyDonation => "piggy_donation",
            Self::ShopPurchase => "shop_purchase",
            Self::HintPurchase => "hint_purchase",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable, signed point delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub child_id: String,
    pub delta: i64,
    pub kind: EntryKind,
    pub reason: String,
    pub created_at: i64,
    pub day: String,
}

/// Result of checking `balance == initial + Σ delta`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerAudit {
    pub initial_balance: i64,
    pub sum_of_deltas: i64,
    pub balance: i64,
    pub entries: usize,
}

impl LedgerAudit {
    pub fn is_consistent(&self) -> bool {
        self.initial_balance + self.sum_of_deltas == self.balance && self.balance >= 0
    }
}

/// Piggy bank movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiggyKind {
    /// Money moved into points custody (gated)
    Savings,
    Spending,
    Donation,
}

impl PiggyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Spending => "spending",
            Self::Donation => "donation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "savings" => Some(Self::Savings),
            "spending" => Some(Self::Spending),
            "donation" => Some(Self::Donation),
            _ => None,
        }
    }

    pub fn entry_kind(&self) -> EntryKind {
        match self {
            Self::Savings => EntryKind::PiggySavings,
            Self::Spending => EntryKind::PiggySpending,
            Self::Donation => EntryKind::PiggyDonation,
        }
    }

    /// Whether this movement needs a parent code first
    pub fn requires_gate(&self) -> bool {
        matches!(self, Self::Savings)
    }
}

/// What a penalty actually did to the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PenaltyOutcome {
    pub requested: i64,
    /// Points actually deducted (requested, capped at the balance)
    pub applied: i64,
    pub balance: i64,
}

impl PenaltyOutcome {
    pub fn was_capped(&self) -> bool {
        self.applied < self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_strings() {
        for kind in EntryKind::ALL {
            assert_eq!(EntryKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::from_str("bonus"), None);
    }

    #[test]
    fn test_piggy_gate_requirement() {
        assert!(PiggyKind::Savings.requires_gate());
        assert!(!PiggyKind::Spending.requires_gate());
        assert!(!PiggyKind::Donation.requires_gate());
        assert_eq!(PiggyKind::Donation.entry_kind(), EntryKind::PiggyDonation);
    }

    #[test]
    fn test_audit_consistency() {
        let audit = LedgerAudit {
            initial_balance: 10,
            sum_of_deltas: -4,
            balance: 6,
            entries: 2,
        };
        assert!(audit.is_consistent());
        assert!(!LedgerAudit { balance: 7, ..audit }.is_consistent());
    }
}
