//! Strongly typed primitives shared by the ledger.

use serde::Deserialize;
use serde::Serialize;

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    parse_display::Display,
    parse_display::FromStr,
)]
pub struct AccountId(pub u32);

/// Unsigned amount of the single asset held by the pool.
///
/// Zero is representable on purpose: rejecting it is a ledger policy
/// ([`crate::engine::LedgerError::ZeroDeposit`]) and not a parsing concern.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Default,
    Hash,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    parse_display::Display,
    parse_display::FromStr,
)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn as_inner(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

/// Seconds since the Unix epoch.
#[derive(
    Debug,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Default,
    Hash,
    PartialEq,
    Eq,
    Ord,
    PartialOrd,
    parse_display::Display,
    parse_display::FromStr,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`, zero if the clock went backwards.
    pub const fn secs_since(&self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub const fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Timestamp(10), Timestamp(4), 6)]
    #[case(Timestamp(4), Timestamp(10), 0)]
    #[case(Timestamp(7), Timestamp(7), 0)]
    fn secs_since_saturates_on_backwards_clock(#[case] now: Timestamp, #[case] earlier: Timestamp, #[case] expected: u64) {
        assert_eq!(now.secs_since(earlier), expected);
    }

    #[test]
    fn amount_checked_arithmetic_detects_overflow_and_underflow() {
        assert_eq!(Amount(u64::MAX).checked_add(Amount(1)), None);
        assert_eq!(Amount(1).checked_sub(Amount(2)), None);
        assert_eq!(Amount(3).checked_sub(Amount(2)), Some(Amount(1)));
        assert_eq!(Amount(1).saturating_sub(Amount(2)), Amount::ZERO);
    }

    #[test]
    fn ids_parse_from_plain_numbers() {
        assert_eq!("42".parse::<AccountId>().ok(), Some(AccountId(42)));
        assert_eq!("1000".parse::<Amount>().ok(), Some(Amount(1000)));
    }
}
