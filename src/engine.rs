//! Accounting and policy-enforcement engine.
//!
//! Provides [`LedgerEngine`] which validates and applies deposits, withdrawals and owner-only
//! administration, mutating accounts via [`crate::account`] helpers.
//! [`interest`] private module computes simple interest accrual.
//! [`reentrancy`] private module provides the guard serializing outbound transfers.

mod interest;
pub mod ledger_engine;
mod reentrancy;

pub use interest::SECONDS_PER_YEAR;
pub use ledger_engine::BankStats;
pub use ledger_engine::LedgerEngine;
pub use ledger_engine::LedgerError;
