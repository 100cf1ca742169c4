use std::cell::Cell;
use std::cell::RefCell;

use crate::account::AccountError;
use crate::account::AccountStats;
use crate::account::LedgerTransaction;
use crate::account::VaultAccount;
use crate::account::VaultAccounts;
use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::config::InterestRate;
use crate::config::LedgerConfig;
use crate::engine::interest::accrued_interest;
use crate::engine::reentrancy::ReentrancyGuard;
use crate::notification::LedgerEvent;
use crate::notification::NotificationSink;
use crate::notification::TracingNotificationSink;
use crate::payment::LoggingPaymentSender;
use crate::payment::PaymentError;
use crate::payment::PaymentSender;
use crate::units::AccountId;
use crate::units::Amount;
use crate::units::Timestamp;

#[cfg(test)]
#[path = "tests/ledger_engine_tests.rs"]
mod ledger_engine_tests;

/// Custodial ledger of a single asset.
///
/// All operations take `&self`: state lives behind a [`RefCell`] that is never borrowed across
/// a call to the [`PaymentSender`], so a sender may call back into the engine. Such nested
/// calls are either trusted (deposits, queries) or rejected with [`LedgerError::Reentrant`]
/// (anything that moves funds out of the pool).
///
/// The engine is not [`Sync`]: it is the single authority serializing every balance-affecting
/// operation.
pub struct LedgerEngine {
    owner: AccountId,
    state: RefCell<LedgerState>,
    transfer_locked: Cell<bool>,
    clock: Box<dyn Clock>,
    payment_sender: Box<dyn PaymentSender>,
    notification_sink: Box<dyn NotificationSink>,
}

impl LedgerEngine {
    pub fn new(
        owner: AccountId,
        config: LedgerConfig,
        clock: impl Clock + 'static,
        payment_sender: impl PaymentSender + 'static,
        notification_sink: impl NotificationSink + 'static,
    ) -> Self {
        Self {
            owner,
            state: RefCell::new(LedgerState::new(config)),
            transfer_locked: Cell::new(false),
            clock: Box::new(clock),
            payment_sender: Box::new(payment_sender),
            notification_sink: Box::new(notification_sink),
        }
    }

    /// Engine owned by `owner` with the supplied `withdrawal_limit`, default policy, wall clock,
    /// logging payment sender and tracing notifications.
    pub fn with_defaults(owner: AccountId, withdrawal_limit: Amount) -> Self {
        Self::new(
            owner,
            LedgerConfig::with_withdrawal_limit(withdrawal_limit),
            SystemClock,
            LoggingPaymentSender,
            TracingNotificationSink,
        )
    }

    /// Credits `amount` to `caller`, first accruing interest on the existing balance.
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `amount` is zero ([`LedgerError::ZeroDeposit`]).
    /// - The pool would hold more than the bank cap ([`LedgerError::CapacityExceeded`]).
    /// - Any counter overflows ([`LedgerError::Overflow`], [`LedgerError::Account`]).
    pub fn deposit(&self, caller: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroDeposit { account_id: caller });
        }

        let now = self.clock.now();
        let (interest, new_balance) = self.state.borrow_mut().deposit(caller, amount, now)?;

        tracing::debug!(account = %caller, %amount, %interest, %new_balance, "deposit applied");
        self.notification_sink.notify(LedgerEvent::DepositMade {
            account_id: caller,
            amount,
            new_balance,
        });

        Ok(new_balance)
    }

    /// Sends `amount` of `caller`'s balance to `caller`. Returns the new balance.
    ///
    /// Balances are debited before the transfer and restored if the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `amount` exceeds the withdrawal limit ([`LedgerError::ExceedsLimit`]), checked before anything else.
    /// - A transfer is already in progress ([`LedgerError::Reentrant`]).
    /// - `amount` is zero ([`LedgerError::ZeroWithdrawal`]).
    /// - The balance is lower than `amount` ([`LedgerError::InsufficientBalance`]).
    /// - The previous withdrawal is too recent ([`LedgerError::CooldownNotMet`]).
    /// - The transfer fails ([`LedgerError::TransferFailed`]).
    pub fn withdraw(&self, caller: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let limit = self.state.borrow().config.withdrawal_limit;
        if amount > limit {
            return Err(LedgerError::ExceedsLimit {
                requested: amount,
                limit,
            });
        }

        let _guard = ReentrancyGuard::acquire(&self.transfer_locked).ok_or(LedgerError::Reentrant)?;

        if amount.is_zero() {
            return Err(LedgerError::ZeroWithdrawal { account_id: caller });
        }

        let now = self.clock.now();
        let pending = {
            let mut state = self.state.borrow_mut();

            let (available, last_withdrawal) = state
                .accounts
                .get(caller)
                .map_or((Amount::ZERO, None), |account| {
                    (account.balance(), account.last_withdrawal_time())
                });
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    account_id: caller,
                    requested: amount,
                    available,
                });
            }

            let cooldown_secs = state.config.withdrawal_cooldown_secs;
            if let Some(last_withdrawal) =
                last_withdrawal.filter(|last| now < last.saturating_add_secs(cooldown_secs))
            {
                return Err(LedgerError::CooldownNotMet {
                    account_id: caller,
                    last_withdrawal,
                    cooldown_secs,
                    now,
                });
            }

            state.debit(caller, amount, now)?
        };

        self.complete_withdrawal(pending)
    }

    /// Sends the whole balance of `caller` to `caller`. Returns the amount sent.
    ///
    /// Neither the withdrawal limit nor the cooldown apply here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A transfer is already in progress ([`LedgerError::Reentrant`]).
    /// - The balance is zero ([`LedgerError::NoBalance`]).
    /// - The transfer fails ([`LedgerError::TransferFailed`]).
    pub fn withdraw_all(&self, caller: AccountId) -> Result<Amount, LedgerError> {
        let _guard = ReentrancyGuard::acquire(&self.transfer_locked).ok_or(LedgerError::Reentrant)?;

        let now = self.clock.now();
        let pending = {
            let mut state = self.state.borrow_mut();

            let balance = state.accounts.get(caller).map_or(Amount::ZERO, VaultAccount::balance);
            if balance.is_zero() {
                return Err(LedgerError::NoBalance { account_id: caller });
            }

            state.debit(caller, balance, now)?
        };

        let amount = pending.amount;
        self.complete_withdrawal(pending)?;
        Ok(amount)
    }

    /// # Errors
    ///
    /// Returns an error if:
    /// - `caller` is not the owner ([`LedgerError::Unauthorized`]).
    /// - `new_cap` does not exceed the funds currently held, including a withdrawal whose transfer
    ///   is still in flight ([`LedgerError::InvalidCap`]).
    pub fn set_bank_cap(&self, caller: AccountId, new_cap: Amount) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;

        let old_cap = {
            let mut state = self.state.borrow_mut();
            let committed = state.committed_balance()?;
            if new_cap <= committed {
                return Err(LedgerError::InvalidCap {
                    requested: new_cap,
                    total_bank_balance: committed,
                });
            }
            std::mem::replace(&mut state.config.bank_cap, new_cap)
        };

        self.notification_sink
            .notify(LedgerEvent::BankCapUpdated { old_cap, new_cap });
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if:
    /// - `caller` is not the owner ([`LedgerError::Unauthorized`]).
    pub fn set_withdrawal_limit(&self, caller: AccountId, new_limit: Amount) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;

        let old_limit = std::mem::replace(&mut self.state.borrow_mut().config.withdrawal_limit, new_limit);

        self.notification_sink
            .notify(LedgerEvent::WithdrawalLimitUpdated { old_limit, new_limit });
        Ok(())
    }

    /// Sends `amount` of the pool's funds to the owner, bypassing per-account accounting.
    /// Returns the funds left in the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `caller` is not the owner ([`LedgerError::Unauthorized`]).
    /// - A transfer is already in progress ([`LedgerError::Reentrant`]).
    /// - The pool holds less than `amount` ([`LedgerError::InsufficientPoolFunds`]).
    /// - The transfer fails ([`LedgerError::TransferFailed`]).
    pub fn emergency_withdraw(&self, caller: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        self.ensure_owner(caller)?;

        let _guard = ReentrancyGuard::acquire(&self.transfer_locked).ok_or(LedgerError::Reentrant)?;

        let available = self.state.borrow().pool_funds;
        if amount > available {
            return Err(LedgerError::InsufficientPoolFunds {
                requested: amount,
                available,
            });
        }

        self.transfer(caller, amount)
            .map_err(|source| LedgerError::TransferFailed {
                recipient: caller,
                amount,
                source,
            })?;

        tracing::warn!(owner = %caller, %amount, "emergency withdrawal executed");
        self.notification_sink
            .notify(LedgerEvent::EmergencyWithdrawal { owner: caller, amount });
        Ok(self.state.borrow().pool_funds)
    }

    /// Balance of `account_id`, zero for accounts that never deposited.
    pub fn balance(&self, account_id: AccountId) -> Amount {
        self.state
            .borrow()
            .accounts
            .get(account_id)
            .map_or(Amount::ZERO, VaultAccount::balance)
    }

    pub fn bank_stats(&self) -> BankStats {
        let state = self.state.borrow();
        BankStats {
            total_bank_balance: state.total_bank_balance,
            total_deposits_count: state.total_deposits_count,
            total_withdrawals_count: state.total_withdrawals_count,
            remaining_capacity: state
                .total_bank_balance
                .checked_add(state.in_flight_outflow)
                .and_then(|committed| state.config.bank_cap.checked_sub(committed))
                .unwrap_or(Amount::ZERO),
        }
    }

    pub fn account_stats(&self, account_id: AccountId) -> AccountStats {
        self.state
            .borrow()
            .accounts
            .get(account_id)
            .map_or(AccountStats::ZERO, VaultAccount::stats)
    }

    pub fn transaction_history(&self, account_id: AccountId) -> Vec<LedgerTransaction> {
        self.state
            .borrow()
            .accounts
            .get(account_id)
            .map_or_else(Vec::new, |account| account.history().to_vec())
    }

    /// Snapshot of every account ever touched, in no particular order.
    pub fn accounts(&self) -> Vec<VaultAccount> {
        self.state.borrow().accounts.as_inner().values().cloned().collect()
    }

    pub const fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn bank_cap(&self) -> Amount {
        self.state.borrow().config.bank_cap
    }

    pub fn withdrawal_limit(&self) -> Amount {
        self.state.borrow().config.withdrawal_limit
    }

    pub fn withdrawal_cooldown_secs(&self) -> u64 {
        self.state.borrow().config.withdrawal_cooldown_secs
    }

    pub fn interest_rate(&self) -> InterestRate {
        self.state.borrow().config.interest_rate
    }

    /// Funds actually held by the pool.
    ///
    /// Differs from [`BankStats::total_bank_balance`] by accrued interest and emergency withdrawals.
    pub fn pool_funds(&self) -> Amount {
        self.state.borrow().pool_funds
    }

    pub fn is_transfer_in_progress(&self) -> bool {
        self.transfer_locked.get()
    }

    fn ensure_owner(&self, caller: AccountId) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Transfers the already debited funds and finalizes the withdrawal, or undoes the debit.
    fn complete_withdrawal(&self, pending: PendingWithdrawal) -> Result<Amount, LedgerError> {
        if let Err(source) = self.transfer(pending.account_id, pending.amount) {
            tracing::warn!(
                account = %pending.account_id,
                amount = %pending.amount,
                error = %source,
                "transfer failed, rolling back withdrawal"
            );
            self.state.borrow_mut().revert_debit(&pending)?;
            return Err(LedgerError::TransferFailed {
                recipient: pending.account_id,
                amount: pending.amount,
                source,
            });
        }

        let new_balance = self.state.borrow_mut().finalize_debit(&pending);

        tracing::debug!(
            account = %pending.account_id,
            amount = %pending.amount,
            %new_balance,
            "withdrawal applied"
        );
        self.notification_sink.notify(LedgerEvent::WithdrawalMade {
            account_id: pending.account_id,
            amount: pending.amount,
            new_balance,
        });

        Ok(new_balance)
    }

    /// Takes `amount` out of the pool and hands it to the payment sender.
    /// The pool funds are restored if the sender fails.
    fn transfer(&self, recipient: AccountId, amount: Amount) -> Result<(), PaymentError> {
        self.state.borrow_mut().reserve_pool_funds(amount)?;

        if let Err(error) = self.payment_sender.send(recipient, amount) {
            self.state.borrow_mut().restore_pool_funds(amount);
            return Err(error);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankStats {
    pub total_bank_balance: Amount,
    pub total_deposits_count: u64,
    pub total_withdrawals_count: u64,
    pub remaining_capacity: Amount,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("deposit amount must be greater than zero account={account_id}")]
    ZeroDeposit { account_id: AccountId },
    #[error("deposit exceeds bank cap attempted={attempted} cap={cap}")]
    CapacityExceeded { attempted: Amount, cap: Amount },
    #[error("withdrawal exceeds limit requested={requested} limit={limit}")]
    ExceedsLimit { requested: Amount, limit: Amount },
    #[error("withdrawal amount must be greater than zero account={account_id}")]
    ZeroWithdrawal { account_id: AccountId },
    #[error("insufficient balance account={account_id} requested={requested} available={available}")]
    InsufficientBalance {
        account_id: AccountId,
        requested: Amount,
        available: Amount,
    },
    #[error(
        "withdrawal cooldown not met account={account_id} last_withdrawal={last_withdrawal} cooldown_secs={cooldown_secs} now={now}"
    )]
    CooldownNotMet {
        account_id: AccountId,
        last_withdrawal: Timestamp,
        cooldown_secs: u64,
        now: Timestamp,
    },
    #[error("no balance to withdraw account={account_id}")]
    NoBalance { account_id: AccountId },
    #[error("reentrant call rejected, a transfer is already in progress")]
    Reentrant,
    #[error("transfer failed recipient={recipient} amount={amount}, error={source}")]
    TransferFailed {
        recipient: AccountId,
        amount: Amount,
        #[source]
        source: PaymentError,
    },
    #[error("unauthorized caller={caller}, owner required")]
    Unauthorized { caller: AccountId },
    #[error("invalid bank cap requested={requested}, must exceed total_bank_balance={total_bank_balance}")]
    InvalidCap {
        requested: Amount,
        total_bank_balance: Amount,
    },
    #[error("emergency withdrawal exceeds pool funds requested={requested} available={available}")]
    InsufficientPoolFunds { requested: Amount, available: Amount },
    #[error("overflow while updating {counter}")]
    Overflow { counter: &'static str },
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl LedgerError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Policy violations never resolve by an immediate retry, nor does a transfer the pool cannot
    /// fund.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Reentrant
                | Self::TransferFailed {
                    source: PaymentError::Rejected { .. },
                    ..
                }
        )
    }
}

struct LedgerState {
    config: LedgerConfig,
    accounts: VaultAccounts,
    total_bank_balance: Amount,
    total_deposits_count: u64,
    total_withdrawals_count: u64,
    pool_funds: Amount,
    /// Debited from `total_bank_balance` but still reserved against the cap until its transfer settles.
    in_flight_outflow: Amount,
}

/// A debit applied to the ledger whose transfer has not completed yet.
#[derive(Debug)]
struct PendingWithdrawal {
    account_id: AccountId,
    amount: Amount,
    record_index: usize,
    now: Timestamp,
}

impl LedgerState {
    fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: VaultAccounts::new(),
            total_bank_balance: Amount::ZERO,
            total_deposits_count: 0,
            total_withdrawals_count: 0,
            pool_funds: Amount::ZERO,
            in_flight_outflow: Amount::ZERO,
        }
    }

    /// Funds the cap is checked against: the bank total plus any debit whose transfer may still be
    /// rolled back.
    fn committed_balance(&self) -> Result<Amount, LedgerError> {
        self.total_bank_balance
            .checked_add(self.in_flight_outflow)
            .ok_or(LedgerError::Overflow {
                counter: "total_bank_balance",
            })
    }

    /// Returns the accrued interest and the new balance.
    fn deposit(
        &mut self,
        account_id: AccountId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<(Amount, Amount), LedgerError> {
        let interest = match self.accounts.get(account_id) {
            Some(account) => pending_interest(account, self.config.interest_rate, now)?,
            None => Amount::ZERO,
        };

        let new_total = self
            .total_bank_balance
            .checked_add(interest)
            .and_then(|total| total.checked_add(amount))
            .ok_or(LedgerError::Overflow {
                counter: "total_bank_balance",
            })?;
        let attempted = new_total
            .checked_add(self.in_flight_outflow)
            .ok_or(LedgerError::Overflow {
                counter: "total_bank_balance",
            })?;
        if attempted > self.config.bank_cap {
            return Err(LedgerError::CapacityExceeded {
                attempted,
                cap: self.config.bank_cap,
            });
        }
        let new_deposits_count = checked_increment(self.total_deposits_count, "total_deposits_count")?;
        let new_pool_funds = self
            .pool_funds
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { counter: "pool_funds" })?;

        let account = self.accounts.get_or_create_new_account(account_id);
        let new_balance = crate::account::deposit(account, amount, interest, now)?;

        self.total_bank_balance = new_total;
        self.total_deposits_count = new_deposits_count;
        self.pool_funds = new_pool_funds;

        Ok((interest, new_balance))
    }

    fn debit(&mut self, account_id: AccountId, amount: Amount, now: Timestamp) -> Result<PendingWithdrawal, LedgerError> {
        let new_total = self
            .total_bank_balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow {
                counter: "total_bank_balance",
            })?;
        let new_withdrawals_count = checked_increment(self.total_withdrawals_count, "total_withdrawals_count")?;
        let new_in_flight = self
            .in_flight_outflow
            .checked_add(amount)
            .ok_or(LedgerError::Overflow {
                counter: "in_flight_outflow",
            })?;

        let account = self.accounts.get_or_create_new_account(account_id);
        let record_index = crate::account::withdraw(account, amount, now)?;

        self.total_bank_balance = new_total;
        self.total_withdrawals_count = new_withdrawals_count;
        self.in_flight_outflow = new_in_flight;

        Ok(PendingWithdrawal {
            account_id,
            amount,
            record_index,
            now,
        })
    }

    fn revert_debit(&mut self, pending: &PendingWithdrawal) -> Result<(), LedgerError> {
        let restored_total = self
            .total_bank_balance
            .checked_add(pending.amount)
            .ok_or(LedgerError::Overflow {
                counter: "total_bank_balance",
            })?;

        let account = self.accounts.get_or_create_new_account(pending.account_id);
        crate::account::revert_withdrawal(account, pending.amount, pending.record_index)?;

        self.total_bank_balance = restored_total;
        self.total_withdrawals_count = self.total_withdrawals_count.saturating_sub(1);
        self.in_flight_outflow = self.in_flight_outflow.saturating_sub(pending.amount);
        Ok(())
    }

    /// Returns the account balance once the withdrawal has settled.
    fn finalize_debit(&mut self, pending: &PendingWithdrawal) -> Amount {
        self.in_flight_outflow = self.in_flight_outflow.saturating_sub(pending.amount);
        let account = self.accounts.get_or_create_new_account(pending.account_id);
        crate::account::mark_withdrawal(account, pending.now);
        account.balance()
    }

    fn reserve_pool_funds(&mut self, amount: Amount) -> Result<(), PaymentError> {
        self.pool_funds = self
            .pool_funds
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientPoolFunds {
                requested: amount,
                available: self.pool_funds,
            })?;
        Ok(())
    }

    fn restore_pool_funds(&mut self, amount: Amount) {
        self.pool_funds = self.pool_funds.saturating_add(amount);
    }
}

fn pending_interest(account: &VaultAccount, rate: InterestRate, now: Timestamp) -> Result<Amount, LedgerError> {
    let Some(last_deposit) = account.last_deposit_time() else {
        return Ok(Amount::ZERO);
    };
    accrued_interest(account.balance(), rate, now.secs_since(last_deposit))
        .ok_or(LedgerError::Overflow { counter: "interest" })
}

fn checked_increment(counter: u64, name: &'static str) -> Result<u64, LedgerError> {
    counter
        .checked_add(1)
        .ok_or(LedgerError::Overflow { counter: name })
}
