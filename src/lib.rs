//! Single-asset custodial vault ledger.
//!
//! [`engine::LedgerEngine`] owns every balance and enforces the pool's policies (bank cap,
//! withdrawal limit, cooldown, interest accrual). Value transfer, notifications and time are
//! supplied by the [`payment`], [`notification`] and [`clock`] collaborators.

pub mod account;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod notification;
pub mod payment;
pub mod units;
