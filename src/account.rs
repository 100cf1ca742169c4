use std::collections::HashMap;

use crate::units::AccountId;

pub mod model;
pub mod ops;

pub use model::AccountStats;
pub use model::LedgerTransaction;
pub use model::TransactionKind;
pub use model::VaultAccount;
pub use ops::AccountError;
pub use ops::deposit;
pub use ops::mark_withdrawal;
pub use ops::revert_withdrawal;
pub use ops::withdraw;

/// Accounts keyed by identity. Accounts are created on first touch and never removed.
#[derive(Debug, Default)]
pub struct VaultAccounts(HashMap<AccountId, VaultAccount>);

impl VaultAccounts {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get_or_create_new_account(&mut self, account_id: AccountId) -> &mut VaultAccount {
        self.0
            .entry(account_id)
            .or_insert_with(|| VaultAccount::new(account_id))
    }

    pub fn get(&self, account_id: AccountId) -> Option<&VaultAccount> {
        self.0.get(&account_id)
    }

    pub fn as_inner(&self) -> &HashMap<AccountId, VaultAccount> {
        &self.0
    }
}
