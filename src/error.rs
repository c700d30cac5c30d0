//! Error taxonomy for the economy core
//!
//! Every operation returns one of these kinds so the calling layer can render
//! a specific message per failure instead of a generic one.

use std::time::Duration;

/// Result alias used throughout the library
pub type EconomyResult<T> = Result<T, EconomyError>;

/// Error type for ledger, gate, riddle and hint operations
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("Today's riddle is already solved")]
    AlreadySolved,

    #[error("Reward {reward_id} was already claimed")]
    AlreadyClaimed { reward_id: String },

    #[error("Parental gate locked, retry in {}s", remaining.as_secs())]
    LockedOut { remaining: Duration },

    #[error("Invalid parent code ({attempts_remaining} attempts remaining)")]
    InvalidCode { attempts_remaining: u32 },

    #[error("Riddle generation failed: {0}")]
    GenerationFailed(String),

    #[error("Storage stayed busy after {attempts} attempts")]
    ConcurrentConflict { attempts: u32 },

    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("No riddle exists for {day}")]
    NoRiddleForDay { day: String },

    #[error("No riddle to buy a hint for today")]
    NoHintContext,

    #[error("Incorrect answer")]
    IncorrectAnswer,

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("No parent code configured for {0}")]
    GateNotConfigured(String),

    #[error("Parent code required for this transaction")]
    ParentCodeRequired,

    #[error("Invalid parent code format: {0}")]
    InvalidCodeFormat(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EconomyError {
    /// Stable snake_case tag for API responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::AlreadySolved => "already_solved",
            Self::AlreadyClaimed { .. } => "already_claimed",
            Self::LockedOut { .. } => "locked_out",
            Self::InvalidCode { .. } => "invalid_code",
            Self::GenerationFailed(_) => "generation_failed",
            Self::ConcurrentConflict { .. } => "concurrent_conflict",
            Self::ChildNotFound(_) => "child_not_found",
            Self::NoRiddleForDay { .. } => "no_riddle_for_day",
            Self::NoHintContext => "no_hint_context",
            Self::IncorrectAnswer => "incorrect_answer",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::GateNotConfigured(_) => "gate_not_configured",
            Self::ParentCodeRequired => "parent_code_required",
            Self::InvalidCodeFormat(_) => "invalid_code_format",
            Self::Hashing(_) => "hashing",
            Self::Storage(_) => "storage",
        }
    }

    /// Duplicate submissions that callers may treat as a no-op success.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadySolved | Self::AlreadyClaimed { .. })
    }

    /// Whether retrying the same request later can succeed without user action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GenerationFailed(_) | Self::ConcurrentConflict { .. } | Self::LockedOut { .. }
        )
    }

    /// True for SQLite contention errors that a fresh transaction may clear.
    pub(crate) fn is_busy(&self) -> bool {
        match self {
            Self::Storage(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_kinds() {
        assert!(EconomyError::AlreadySolved.is_duplicate());
        assert!(
            EconomyError::AlreadyClaimed {
                reward_id: "r1".to_string()
            }
            .is_duplicate()
        );
        assert!(!EconomyError::IncorrectAnswer.is_duplicate());
    }

    #[test]
    fn test_busy_detection() {
        let busy = EconomyError::Storage(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(busy.is_busy());
        assert!(!EconomyError::AlreadySolved.is_busy());
    }

    #[test]
    fn test_locked_out_message() {
        let err = EconomyError::LockedOut {
            remaining: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "Parental gate locked, retry in 90s");
        assert_eq!(err.kind(), "locked_out");
        assert!(err.is_retryable());
    }
}
