use std::io::Write;

use csv::Writer;
use serde::Serialize;
use thiserror::Error;
use vaultledger::account::VaultAccount;
use vaultledger::units::AccountId;
use vaultledger::units::Amount;

#[derive(Debug, Error)]
pub enum CsvReportError {
    #[error("csv serialization error for account={account_id}, source_error={source:?}")]
    Csv {
        account_id: AccountId,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write the supplied [`VaultAccount`]'s to stdout as CSV in ascending account id order.
/// Returns a [`Vec`] of [`CsvReportError`] representing all the possible errors encountered during
/// reporting.
///
/// The sorting happens here so that the ledger keeps its accounts in a
/// [`std::collections::HashMap`] and the report stays reproducible.
pub fn write_to_stdout<'a, I>(accounts: I) -> Vec<CsvReportError>
where
    I: IntoIterator<Item = &'a VaultAccount>,
{
    write_to(accounts, std::io::stdout())
}

pub fn write_to<'a, I, W>(accounts: I, output: W) -> Vec<CsvReportError>
where
    I: IntoIterator<Item = &'a VaultAccount>,
    W: Write,
{
    let mut accounts: Vec<&VaultAccount> = accounts.into_iter().collect();
    accounts.sort_unstable_by_key(|account| account.account_id());

    let mut writer = Writer::from_writer(output);
    let mut errors: Vec<CsvReportError> = Vec::new();

    for account in accounts {
        if let Err(source) = writer.serialize(AccountReport::from(account)) {
            errors.push(CsvReportError::Csv {
                account_id: account.account_id(),
                source,
            });
        }
    }

    if let Err(io_err) = writer.flush() {
        errors.push(CsvReportError::Io(io_err));
    }

    errors
}

#[derive(Serialize)]
struct AccountReport {
    account: AccountId,
    balance: Amount,
    total_deposited: Amount,
    total_withdrawn: Amount,
    net_deposit: Amount,
    transactions: usize,
}

impl From<&VaultAccount> for AccountReport {
    fn from(account: &VaultAccount) -> Self {
        let stats = account.stats();
        Self {
            account: account.account_id(),
            balance: account.balance(),
            total_deposited: stats.total_deposited,
            total_withdrawn: stats.total_withdrawn,
            net_deposit: stats.net_deposit,
            transactions: account.history().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use vaultledger::account::VaultAccounts;
    use vaultledger::units::Timestamp;

    use super::*;

    #[test]
    fn write_to_sorts_accounts_by_id() {
        let mut accounts = VaultAccounts::new();
        for (id, amount) in [(3, 30), (1, 10), (2, 20)] {
            let account = accounts.get_or_create_new_account(AccountId(id));
            vaultledger::account::deposit(account, Amount(amount), Amount::ZERO, Timestamp(0)).unwrap();
        }
        let mut output = Vec::new();

        let errors = write_to(accounts.as_inner().values(), &mut output);

        assert!(errors.is_empty(), "errors={errors:?}");
        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        account,balance,total_deposited,total_withdrawn,net_deposit,transactions
        1,10,10,0,10,1
        2,20,20,0,20,1
        3,30,30,0,30,1
        ");
    }
}
