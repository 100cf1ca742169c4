//! Policy parameters of the ledger.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::units::Amount;

pub const DEFAULT_BANK_CAP: Amount = Amount(1_000_000);
pub const DEFAULT_WITHDRAWAL_COOLDOWN_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    pub bank_cap: Amount,
    pub withdrawal_limit: Amount,
    pub withdrawal_cooldown_secs: u64,
    pub interest_rate: InterestRate,
}

impl LedgerConfig {
    /// Builds a config with the supplied `withdrawal_limit` and defaults for everything else.
    pub fn with_withdrawal_limit(withdrawal_limit: Amount) -> Self {
        Self {
            bank_cap: DEFAULT_BANK_CAP,
            withdrawal_limit,
            withdrawal_cooldown_secs: DEFAULT_WITHDRAWAL_COOLDOWN_SECS,
            interest_rate: InterestRate::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InterestRateError {
    #[error("interest rate must not be negative rate={rate}")]
    Negative { rate: Decimal },
    #[error("invalid interest rate value={value:?}, error={source}")]
    Parse {
        value: String,
        #[source]
        source: rust_decimal::Error,
    },
}

/// Annual simple-interest rate expressed as a fraction (`0.05` is 5% per year).
///
/// Never negative, so accrued interest can only grow a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display)]
pub struct InterestRate(Decimal);

impl InterestRate {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub const fn as_inner(&self) -> Decimal {
        self.0
    }
}

impl Default for InterestRate {
    fn default() -> Self {
        // 5% per year.
        Self(Decimal::new(5, 2))
    }
}

impl TryFrom<Decimal> for InterestRate {
    type Error = InterestRateError;

    fn try_from(rate: Decimal) -> Result<Self, Self::Error> {
        if rate.is_sign_negative() && !rate.is_zero() {
            return Err(InterestRateError::Negative { rate });
        }
        Ok(Self(rate))
    }
}

impl FromStr for InterestRate {
    type Err = InterestRateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let rate = Decimal::from_str(value.trim()).map_err(|source| InterestRateError::Parse {
            value: value.to_owned(),
            source,
        })?;
        Self::try_from(rate)
    }
}
