use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive as _;

use crate::config::InterestRate;
use crate::units::Amount;

pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Simple interest earned by `balance` over `elapsed_secs` at the annual `rate`, rounded down.
///
/// Returns [`None`] if the computation overflows.
pub(in crate::engine) fn accrued_interest(balance: Amount, rate: InterestRate, elapsed_secs: u64) -> Option<Amount> {
    if balance.is_zero() || elapsed_secs == 0 || rate.as_inner().is_zero() {
        return Some(Amount::ZERO);
    }

    Decimal::from(balance.as_inner())
        .checked_mul(Decimal::from(elapsed_secs))?
        .checked_mul(rate.as_inner())?
        .checked_div(Decimal::from(SECONDS_PER_YEAR))?
        .floor()
        .to_u64()
        .map(Amount)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn rate(value: &str) -> InterestRate {
        value.parse().unwrap()
    }

    #[rstest]
    #[case(Amount(100), "0.05", SECONDS_PER_YEAR, Amount(5))]
    #[case(Amount(100), "0.05", SECONDS_PER_YEAR / 2, Amount(2))]
    #[case(Amount(1_000_000), "0.05", 24 * 60 * 60, Amount(136))]
    #[case(Amount(100), "0.05", 0, Amount::ZERO)]
    #[case(Amount::ZERO, "0.05", SECONDS_PER_YEAR, Amount::ZERO)]
    #[case(Amount(100), "0", SECONDS_PER_YEAR, Amount::ZERO)]
    #[case(Amount(10), "0.05", SECONDS_PER_YEAR, Amount::ZERO)]
    fn accrued_interest_is_simple_and_rounded_down(
        #[case] balance: Amount,
        #[case] annual_rate: &str,
        #[case] elapsed_secs: u64,
        #[case] expected: Amount,
    ) {
        assert_eq!(accrued_interest(balance, rate(annual_rate), elapsed_secs), Some(expected));
    }

    #[test]
    fn accrued_interest_reports_overflow() {
        assert_eq!(accrued_interest(Amount(u64::MAX), rate("1000"), u64::MAX), None);
    }
}
