//! Free functions that mutate a supplied [`VaultAccount`].
//!
//! Every function computes all the new values with checked arithmetic first and only then
//! writes them back, so a failing call leaves the account untouched.
//! Policy checks (limits, cooldown, capacity) are not performed here: they belong to
//! [`crate::engine::LedgerEngine`].

use crate::account::AccountStats;
use crate::account::LedgerTransaction;
use crate::account::TransactionKind;
use crate::account::VaultAccount;
use crate::units::AccountId;
use crate::units::Amount;
use crate::units::Timestamp;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("overflow while adding amount={amount} to account={account_id} balance={balance}")]
    BalanceOverflow {
        account_id: AccountId,
        balance: Amount,
        amount: Amount,
    },
    #[error("underflow while subtracting amount={amount} from account={account_id} balance={balance}")]
    BalanceUnderflow {
        account_id: AccountId,
        balance: Amount,
        amount: Amount,
    },
    #[error("no transaction record at index={index} for account={account_id}")]
    MissingRecord { account_id: AccountId, index: usize },
}

/// Accrues `interest` on the current balance, then credits `amount`, updates stats, appends a
/// deposit record and stamps the deposit time.
///
/// Interest is added to the balance only: it is neither counted as deposited nor recorded in
/// the history.
///
/// # Errors
///
/// Returns an error if:
/// - Adding `interest` and `amount` to the balance, or `amount` to the deposited total, overflows
///   ([`AccountError::BalanceOverflow`]).
pub fn deposit(
    account: &mut VaultAccount,
    amount: Amount,
    interest: Amount,
    now: Timestamp,
) -> Result<Amount, AccountError> {
    let accrued_balance = checked_add(account, account.balance, interest)?;
    let new_balance = checked_add(account, accrued_balance, amount)?;
    let new_total_deposited = checked_add(account, account.stats.total_deposited, amount)?;

    account.balance = new_balance;
    account.stats = AccountStats {
        total_deposited: new_total_deposited,
        net_deposit: new_balance,
        ..account.stats
    };
    account.history.push(LedgerTransaction {
        amount,
        timestamp: now,
        kind: TransactionKind::Deposit,
    });
    account.last_deposit_time = Some(now);

    Ok(new_balance)
}

/// Debits `amount`, updates stats and appends a withdrawal record.
///
/// The withdrawal time is not stamped here: it is only set once the funds actually left the
/// pool, see [`mark_withdrawal`].
/// Returns the position of the appended record, needed by [`revert_withdrawal`].
///
/// # Errors
///
/// Returns an error if:
/// - The balance is lower than `amount` ([`AccountError::BalanceUnderflow`]).
/// - Adding `amount` to the withdrawn total overflows ([`AccountError::BalanceOverflow`]).
pub fn withdraw(account: &mut VaultAccount, amount: Amount, now: Timestamp) -> Result<usize, AccountError> {
    let new_balance = checked_sub(account, account.balance, amount)?;
    let new_total_withdrawn = checked_add(account, account.stats.total_withdrawn, amount)?;

    account.balance = new_balance;
    account.stats = AccountStats {
        total_withdrawn: new_total_withdrawn,
        net_deposit: new_balance,
        ..account.stats
    };
    account.history.push(LedgerTransaction {
        amount,
        timestamp: now,
        kind: TransactionKind::Withdrawal,
    });

    Ok(account.history.len() - 1)
}

/// Reverses exactly what [`withdraw`] did for the record at `record_index`.
///
/// Records appended after `record_index` (e.g. by a deposit made while the withdrawal was
/// in flight) are preserved.
///
/// # Errors
///
/// Returns an error if:
/// - There is no withdrawal record at `record_index` ([`AccountError::MissingRecord`]).
/// - Restoring the balance overflows ([`AccountError::BalanceOverflow`]).
/// - The withdrawn total is lower than `amount` ([`AccountError::BalanceUnderflow`]).
pub fn revert_withdrawal(account: &mut VaultAccount, amount: Amount, record_index: usize) -> Result<(), AccountError> {
    let is_matching_record = account
        .history
        .get(record_index)
        .is_some_and(|record| !record.is_deposit() && record.amount == amount);
    if !is_matching_record {
        return Err(AccountError::MissingRecord {
            account_id: account.account_id,
            index: record_index,
        });
    }

    let new_balance = checked_add(account, account.balance, amount)?;
    let new_total_withdrawn = checked_sub(account, account.stats.total_withdrawn, amount)?;

    account.balance = new_balance;
    account.stats = AccountStats {
        total_withdrawn: new_total_withdrawn,
        net_deposit: new_balance,
        ..account.stats
    };
    account.history.remove(record_index);

    Ok(())
}

/// Stamps the time of the last completed withdrawal, starting a new cooldown window.
pub const fn mark_withdrawal(account: &mut VaultAccount, now: Timestamp) {
    account.last_withdrawal_time = Some(now);
}

fn checked_add(account: &VaultAccount, lhs: Amount, amount: Amount) -> Result<Amount, AccountError> {
    lhs.checked_add(amount).ok_or(AccountError::BalanceOverflow {
        account_id: account.account_id,
        balance: lhs,
        amount,
    })
}

fn checked_sub(account: &VaultAccount, lhs: Amount, amount: Amount) -> Result<Amount, AccountError> {
    lhs.checked_sub(amount).ok_or(AccountError::BalanceUnderflow {
        account_id: account.account_id,
        balance: lhs,
        amount,
    })
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use pretty_assertions::assert_eq;

    use super::*;

    const TEST_ACCOUNT_ID: AccountId = AccountId(7);

    #[test]
    fn deposit_updates_balance_stats_history_and_time() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);

        let_assert!(Ok(new_balance) = deposit(&mut account, Amount(40), Amount::ZERO, Timestamp(3)));

        assert_eq!(new_balance, Amount(40));
        assert_eq!(
            account.stats(),
            AccountStats {
                total_deposited: Amount(40),
                total_withdrawn: Amount::ZERO,
                net_deposit: Amount(40),
            }
        );
        assert_eq!(
            account.history(),
            [LedgerTransaction {
                amount: Amount(40),
                timestamp: Timestamp(3),
                kind: TransactionKind::Deposit,
            }]
        );
        assert_eq!(account.last_deposit_time(), Some(Timestamp(3)));
    }

    #[test]
    fn deposit_overflow_leaves_account_untouched() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(u64::MAX), Amount::ZERO, Timestamp(1)));
        let before = account.clone();

        let_assert!(Err(AccountError::BalanceOverflow { amount, .. }) = deposit(&mut account, Amount(1), Amount::ZERO, Timestamp(2)));

        assert_eq!(amount, Amount(1));
        assert_eq!(account, before);
    }

    #[test]
    fn deposit_accrues_interest_before_crediting_without_counting_it_as_deposited() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(100), Amount::ZERO, Timestamp(0)));

        let_assert!(Ok(new_balance) = deposit(&mut account, Amount(20), Amount(5), Timestamp(9)));

        assert_eq!(new_balance, Amount(125));
        assert_eq!(account.stats().total_deposited, Amount(120));
        assert_eq!(account.stats().net_deposit, Amount(125));
        let amounts: Vec<Amount> = account.history().iter().map(|record| record.amount).collect();
        assert_eq!(amounts, [Amount(100), Amount(20)]);
    }

    #[test]
    fn deposit_interest_overflow_leaves_account_untouched() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(u64::MAX - 1), Amount::ZERO, Timestamp(0)));
        let before = account.clone();

        let_assert!(Err(AccountError::BalanceOverflow { .. }) = deposit(&mut account, Amount(1), Amount(1), Timestamp(5)));

        assert_eq!(account, before);
    }

    #[test]
    fn withdraw_underflow_leaves_account_untouched() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(10), Amount::ZERO, Timestamp(0)));
        let before = account.clone();

        let_assert!(
            Err(AccountError::BalanceUnderflow { balance, amount, .. }) =
                withdraw(&mut account, Amount(11), Timestamp(1))
        );

        assert_eq!(balance, Amount(10));
        assert_eq!(amount, Amount(11));
        assert_eq!(account, before);
    }

    #[test]
    fn withdraw_does_not_stamp_withdrawal_time() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(10), Amount::ZERO, Timestamp(0)));

        let_assert!(Ok(index) = withdraw(&mut account, Amount(4), Timestamp(1)));

        assert_eq!(index, 1);
        assert_eq!(account.balance(), Amount(6));
        assert_eq!(account.stats().net_deposit, Amount(6));
        assert_eq!(account.stats().total_withdrawn, Amount(4));
        assert_eq!(account.last_withdrawal_time(), None);

        mark_withdrawal(&mut account, Timestamp(1));
        assert_eq!(account.last_withdrawal_time(), Some(Timestamp(1)));
    }

    #[test]
    fn revert_withdrawal_keeps_records_appended_afterwards() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(10), Amount::ZERO, Timestamp(0)));
        let_assert!(Ok(index) = withdraw(&mut account, Amount(4), Timestamp(1)));
        let_assert!(Ok(_) = deposit(&mut account, Amount(2), Amount::ZERO, Timestamp(1)));

        let_assert!(Ok(()) = revert_withdrawal(&mut account, Amount(4), index));

        assert_eq!(account.balance(), Amount(12));
        assert_eq!(
            account.stats(),
            AccountStats {
                total_deposited: Amount(12),
                total_withdrawn: Amount::ZERO,
                net_deposit: Amount(12),
            }
        );
        let kinds: Vec<TransactionKind> = account.history().iter().map(|record| record.kind).collect();
        assert_eq!(kinds, [TransactionKind::Deposit, TransactionKind::Deposit]);
    }

    #[test]
    fn revert_withdrawal_rejects_mismatching_record() {
        let mut account = VaultAccount::new(TEST_ACCOUNT_ID);
        let_assert!(Ok(_) = deposit(&mut account, Amount(10), Amount::ZERO, Timestamp(0)));

        let_assert!(Err(AccountError::MissingRecord { index, .. }) = revert_withdrawal(&mut account, Amount(10), 0));

        assert_eq!(index, 0);
        assert_eq!(account.balance(), Amount(10));
    }
}
