//! Core domain types for the child economy

mod child;
mod ledger;

pub use child::{Child, ChildId, NewChild};
pub use ledger::{EntryKind, LedgerAudit, LedgerEntry, PenaltyOutcome, PiggyKind};
