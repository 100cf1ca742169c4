//! Outbound value transfers.

use crate::units::AccountId;
use crate::units::Amount;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("pool holds funds={available}, cannot send amount={requested}")]
    InsufficientPoolFunds { requested: Amount, available: Amount },
    #[error("payment rejected recipient={recipient} amount={amount} reason={reason}")]
    Rejected {
        recipient: AccountId,
        amount: Amount,
        reason: String,
    },
}

/// Moves funds out of the pool's custody.
///
/// Implementations are untrusted: they may call back into the ledger while a transfer is in
/// flight. The ledger protects itself against that, implementations don't have to.
pub trait PaymentSender {
    /// # Errors
    ///
    /// Returns an error if the funds could not be delivered to `recipient`.
    fn send(&self, recipient: AccountId, amount: Amount) -> Result<(), PaymentError>;
}

/// Sender that accepts every transfer and only logs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPaymentSender;

impl PaymentSender for LoggingPaymentSender {
    fn send(&self, recipient: AccountId, amount: Amount) -> Result<(), PaymentError> {
        tracing::info!(%recipient, %amount, "payment sent");
        Ok(())
    }
}
