//! kidbank - child economy ledger and parental gate
//!
//! Children earn points for tasks and daily riddles and spend them on rewards,
//! shop items and hints. Every balance change is an append-only ledger entry
//! written in the same transaction as the balance update, so the balance
//! always equals the starting balance plus the sum of recorded deltas.
//!
//! ## Components
//!
//! - [`ledger`] and [`economy`]: balances and the business operations
//! - [`gate`]: parent code verification with a persisted lockout
//! - [`riddle`] and [`hint`]: idempotent daily riddles and paid hints
//! - [`streak`]: consecutive-day streaks from task history
//! - [`api`]: local JSON control API

pub mod api;
pub mod children;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod economy;
pub mod error;
pub mod gate;
pub mod hint;
pub mod ledger;
pub mod riddle;
pub mod streak;

pub use domain::*;
pub use economy::Economy;
pub use error::{EconomyError, EconomyResult};
