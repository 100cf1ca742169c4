//! Fire-and-forget notifications emitted after successful ledger mutations.

use crate::units::AccountId;
use crate::units::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
pub enum LedgerEvent {
    #[display("deposit made account={account_id} amount={amount} new_balance={new_balance}")]
    DepositMade {
        account_id: AccountId,
        amount: Amount,
        new_balance: Amount,
    },
    #[display("withdrawal made account={account_id} amount={amount} new_balance={new_balance}")]
    WithdrawalMade {
        account_id: AccountId,
        amount: Amount,
        new_balance: Amount,
    },
    #[display("bank cap updated old={old_cap} new={new_cap}")]
    BankCapUpdated { old_cap: Amount, new_cap: Amount },
    #[display("withdrawal limit updated old={old_limit} new={new_limit}")]
    WithdrawalLimitUpdated { old_limit: Amount, new_limit: Amount },
    #[display("emergency withdrawal owner={owner} amount={amount}")]
    EmergencyWithdrawal { owner: AccountId, amount: Amount },
}

pub trait NotificationSink {
    fn notify(&self, event: LedgerEvent);
}

/// Sink that turns every [`LedgerEvent`] into an `info` log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, event: LedgerEvent) {
        tracing::info!(%event, "ledger event");
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        LedgerEvent::DepositMade { account_id: AccountId(1), amount: Amount(10), new_balance: Amount(15) },
        "deposit made account=1 amount=10 new_balance=15"
    )]
    #[case(
        LedgerEvent::BankCapUpdated { old_cap: Amount(5), new_cap: Amount(9) },
        "bank cap updated old=5 new=9"
    )]
    #[case(
        LedgerEvent::EmergencyWithdrawal { owner: AccountId(0), amount: Amount(3) },
        "emergency withdrawal owner=0 amount=3"
    )]
    fn ledger_event_display_names_its_operands(#[case] event: LedgerEvent, #[case] expected: &str) {
        assert_eq!(event.to_string(), expected);
    }
}
