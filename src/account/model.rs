use crate::units::AccountId;
use crate::units::Amount;
use crate::units::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultAccount {
    pub(in crate::account) account_id: AccountId,
    pub(in crate::account) balance: Amount,
    pub(in crate::account) last_deposit_time: Option<Timestamp>,
    pub(in crate::account) last_withdrawal_time: Option<Timestamp>,
    pub(in crate::account) stats: AccountStats,
    pub(in crate::account) history: Vec<LedgerTransaction>,
}

impl VaultAccount {
    pub const fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            balance: Amount::ZERO,
            last_deposit_time: None,
            last_withdrawal_time: None,
            stats: AccountStats::ZERO,
            history: Vec::new(),
        }
    }

    pub const fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Withdrawable balance, accrued interest included.
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    pub const fn last_deposit_time(&self) -> Option<Timestamp> {
        self.last_deposit_time
    }

    pub const fn last_withdrawal_time(&self) -> Option<Timestamp> {
        self.last_withdrawal_time
    }

    pub const fn stats(&self) -> AccountStats {
        self.stats
    }

    /// Deposits and withdrawals in insertion order.
    pub fn history(&self) -> &[LedgerTransaction] {
        &self.history
    }
}

/// Running totals of an account.
///
/// `total_deposited` and `total_withdrawn` only grow; `net_deposit` mirrors the balance
/// after every deposit or withdrawal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStats {
    pub total_deposited: Amount,
    pub total_withdrawn: Amount,
    pub net_deposit: Amount,
}

impl AccountStats {
    pub const ZERO: Self = Self {
        total_deposited: Amount::ZERO,
        total_withdrawn: Amount::ZERO,
        net_deposit: Amount::ZERO,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
#[display("{kind} amount={amount} timestamp={timestamp}")]
pub struct LedgerTransaction {
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub kind: TransactionKind,
}

impl LedgerTransaction {
    pub const fn is_deposit(&self) -> bool {
        self.kind.is_deposit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
#[display(style = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub const fn is_deposit(self) -> bool {
        match self {
            Self::Deposit => true,
            Self::Withdrawal => false,
        }
    }
}
