use serde::Deserialize;
use serde::Deserializer;

use crate::clock::ManualClock;
use crate::engine::LedgerEngine;
use crate::engine::LedgerError;
use crate::units::AccountId;
use crate::units::Amount;
use crate::units::Timestamp;

/// Ledger operation requested by an already authenticated `caller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
pub enum Command {
    #[display("deposit caller={caller} amount={amount}")]
    Deposit { caller: AccountId, amount: Amount },
    #[display("withdraw caller={caller} amount={amount}")]
    Withdraw { caller: AccountId, amount: Amount },
    #[display("withdraw_all caller={caller}")]
    WithdrawAll { caller: AccountId },
    #[display("set_bank_cap caller={caller} new_cap={new_cap}")]
    SetBankCap { caller: AccountId, new_cap: Amount },
    #[display("set_withdrawal_limit caller={caller} new_limit={new_limit}")]
    SetWithdrawalLimit { caller: AccountId, new_limit: Amount },
    #[display("emergency_withdraw caller={caller} amount={amount}")]
    EmergencyWithdraw { caller: AccountId, amount: Amount },
}

impl Command {
    /// # Errors
    ///
    /// Returns the [`LedgerError`] of the underlying engine operation.
    pub fn apply(self, engine: &LedgerEngine) -> Result<CommandOutcome, LedgerError> {
        match self {
            Self::Deposit { caller, amount } => engine.deposit(caller, amount).map(CommandOutcome::Balance),
            Self::Withdraw { caller, amount } => engine.withdraw(caller, amount).map(CommandOutcome::Balance),
            Self::WithdrawAll { caller } => engine.withdraw_all(caller).map(CommandOutcome::Withdrawn),
            Self::SetBankCap { caller, new_cap } => engine
                .set_bank_cap(caller, new_cap)
                .map(|()| CommandOutcome::Updated),
            Self::SetWithdrawalLimit { caller, new_limit } => engine
                .set_withdrawal_limit(caller, new_limit)
                .map(|()| CommandOutcome::Updated),
            Self::EmergencyWithdraw { caller, amount } => engine
                .emergency_withdraw(caller, amount)
                .map(CommandOutcome::PoolFunds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
pub enum CommandOutcome {
    #[display("balance={0}")]
    Balance(Amount),
    #[display("withdrawn={0}")]
    Withdrawn(Amount),
    #[display("pool_funds={0}")]
    PoolFunds(Amount),
    #[display("updated")]
    Updated,
}

/// A [`Command`] paired with the instant it was issued at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
#[display("{command} timestamp={timestamp}")]
pub struct ScheduledCommand {
    pub timestamp: Timestamp,
    pub command: Command,
}

impl ScheduledCommand {
    /// Moves `clock` to the command's timestamp, then applies the command.
    ///
    /// # Errors
    ///
    /// Returns the [`LedgerError`] of the underlying engine operation.
    pub fn apply(self, engine: &LedgerEngine, clock: &ManualClock) -> Result<CommandOutcome, LedgerError> {
        clock.set(self.timestamp);
        self.command.apply(engine)
    }
}

impl<'de> Deserialize<'de> for ScheduledCommand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CsvRow {
            command: String,
            caller: AccountId,
            amount: Option<Amount>,
            timestamp: Timestamp,
        }

        let row = CsvRow::deserialize(deserializer)?;
        let caller = row.caller;
        let amount = || -> Result<Amount, D::Error> {
            row.amount
                .ok_or_else(|| serde::de::Error::missing_field("amount"))
        };

        let command = match row.command.as_str() {
            "deposit" => Command::Deposit {
                caller,
                amount: amount()?,
            },
            "withdraw" => Command::Withdraw {
                caller,
                amount: amount()?,
            },
            "withdraw_all" => Command::WithdrawAll { caller },
            "set_bank_cap" => Command::SetBankCap {
                caller,
                new_cap: amount()?,
            },
            "set_withdrawal_limit" => Command::SetWithdrawalLimit {
                caller,
                new_limit: amount()?,
            },
            "emergency_withdraw" => Command::EmergencyWithdraw {
                caller,
                amount: amount()?,
            },
            other => {
                return Err(serde::de::Error::unknown_variant(
                    other,
                    &[
                        "deposit",
                        "withdraw",
                        "withdraw_all",
                        "set_bank_cap",
                        "set_withdrawal_limit",
                        "emergency_withdraw",
                    ],
                ));
            }
        };

        Ok(Self {
            timestamp: row.timestamp,
            command,
        })
    }
}
