//! Fixed-point monetary amount.
//!
//! An [`Amount`] is a signed count of atoms, the smallest currency unit.
//! All arithmetic is integer arithmetic; decimal coin strings are parsed
//! digit by digit so no value ever passes through a float.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ATOMS_PER_COIN, COIN_DECIMALS};
use crate::error::AmountError;

/// A signed amount of atoms (1 COIN = 10^8 atoms).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero atoms.
    pub const ZERO: Self = Self(0);

    /// One whole coin.
    pub const ONE_COIN: Self = Self(ATOMS_PER_COIN);

    pub const fn from_atoms(atoms: i64) -> Self {
        Self(atoms)
    }

    /// Whole coins, `None` on overflow.
    pub fn from_coins(coins: i64) -> Option<Self> {
        coins.checked_mul(ATOMS_PER_COIN).map(Self)
    }

    pub const fn atoms(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Multiply by a scalar, e.g. a size in bytes times a per-byte rate.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    /// Sum an iterator of amounts, `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(iter: I) -> Option<Self> {
        iter.into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<i64> for Amount {
    fn from(atoms: i64) -> Self {
        Self(atoms)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_coin = ATOMS_PER_COIN as u64;
        write!(
            f,
            "{sign}{}.{:0width$}",
            abs / per_coin,
            abs % per_coin,
            width = COIN_DECIMALS
        )
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a decimal coin string such as `"1.5"`, `"-0.1"` or `"42"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Parse(s.to_string()));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AmountError::Parse(s.to_string()));
        }
        if frac.len() > COIN_DECIMALS {
            return Err(AmountError::Precision(s.to_string()));
        }

        let whole_atoms = if whole.is_empty() {
            0
        } else {
            // Only digits remain, so the sole failure mode is overflow.
            whole.parse::<u64>().map_err(|_| AmountError::Overflow)?
        };

        let mut frac_atoms: u64 = 0;
        for b in frac.bytes() {
            frac_atoms = frac_atoms * 10 + u64::from(b - b'0');
        }
        for _ in frac.len()..COIN_DECIMALS {
            frac_atoms *= 10;
        }

        let magnitude = whole_atoms
            .checked_mul(ATOMS_PER_COIN as u64)
            .and_then(|w| w.checked_add(frac_atoms))
            .ok_or(AmountError::Overflow)?;

        // The magnitude of i64::MIN is one past i64::MAX.
        let atoms = if negative {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        atoms.map(Self).ok_or(AmountError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_whole_and_fraction() {
        assert_eq!(Amount::from_atoms(150_000_000).to_string(), "1.50000000");
        assert_eq!(Amount::from_atoms(1).to_string(), "0.00000001");
        assert_eq!(Amount::from_atoms(-1).to_string(), "-0.00000001");
        assert_eq!(Amount::ZERO.to_string(), "0.00000000");
    }

    #[test]
    fn display_extreme_values() {
        assert_eq!(Amount::from_atoms(i64::MIN).to_string(), "-92233720368.54775808");
        assert_eq!(Amount::from_atoms(i64::MAX).to_string(), "92233720368.54775807");
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!("1.5".parse::<Amount>().unwrap(), Amount::from_atoms(150_000_000));
        assert_eq!("42".parse::<Amount>().unwrap(), Amount::from_atoms(4_200_000_000));
        assert_eq!(".5".parse::<Amount>().unwrap(), Amount::from_atoms(50_000_000));
        assert_eq!("-0.1".parse::<Amount>().unwrap(), Amount::from_atoms(-10_000_000));
        assert_eq!("+0.00000001".parse::<Amount>().unwrap(), Amount::from_atoms(1));
        assert_eq!(" 3. ".parse::<Amount>().unwrap(), Amount::from_atoms(300_000_000));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!("".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("-".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!(".".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("1.2.3".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("1e8".parse::<Amount>(), Err(AmountError::Parse(_))));
        assert!(matches!("--1".parse::<Amount>(), Err(AmountError::Parse(_))));
    }

    #[test]
    fn parse_rejects_sub_atom_precision() {
        assert!(matches!(
            "0.000000001".parse::<Amount>(),
            Err(AmountError::Precision(_))
        ));
    }

    #[test]
    fn parse_extreme_values() {
        assert_eq!(
            "-92233720368.54775808".parse::<Amount>(),
            Ok(Amount::from_atoms(i64::MIN))
        );
        assert_eq!(
            "92233720368.54775807".parse::<Amount>(),
            Ok(Amount::from_atoms(i64::MAX))
        );
    }

    #[test]
    fn parse_rejects_overflow() {
        assert_eq!(
            "92233720369".parse::<Amount>(),
            Err(AmountError::Overflow)
        );
        assert_eq!(
            "92233720368.54775808".parse::<Amount>(),
            Err(AmountError::Overflow)
        );
        assert_eq!(
            "-92233720368.54775809".parse::<Amount>(),
            Err(AmountError::Overflow)
        );
        assert_eq!(
            "99999999999999999999".parse::<Amount>(),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn checked_arithmetic() {
        let a = Amount::from_atoms(10);
        let b = Amount::from_atoms(3);
        assert_eq!(a.checked_add(b), Some(Amount::from_atoms(13)));
        assert_eq!(b.checked_sub(a), Some(Amount::from_atoms(-7)));
        assert_eq!(b.checked_mul(4), Some(Amount::from_atoms(12)));
        assert_eq!(Amount::from_atoms(i64::MAX).checked_add(b), None);
        assert_eq!(Amount::from_atoms(i64::MIN).checked_sub(b), None);
        assert_eq!(Amount::from_atoms(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn sums() {
        let amounts = [Amount::from_atoms(1), Amount::from_atoms(2), Amount::from_atoms(3)];
        assert_eq!(Amount::checked_sum(amounts), Some(Amount::from_atoms(6)));
        assert_eq!(
            Amount::checked_sum([Amount::from_atoms(i64::MAX), Amount::from_atoms(1)]),
            None
        );
    }

    #[test]
    fn from_coins() {
        assert_eq!(Amount::from_coins(2), Some(Amount::from_atoms(200_000_000)));
        assert_eq!(Amount::from_coins(i64::MAX), None);
    }

    #[test]
    fn sign_predicates() {
        assert!(Amount::ONE_COIN.is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
        assert!((-Amount::ONE_COIN).is_negative());
    }

    #[test]
    fn serde_as_atoms() {
        let json = serde_json::to_string(&Amount::from_atoms(46_920)).unwrap();
        assert_eq!(json, "46920");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::from_atoms(46_920));
    }

    proptest::proptest! {
        #[test]
        fn display_then_parse_preserves_atoms(atoms in proptest::prelude::any::<i64>()) {
            let amount = Amount::from_atoms(atoms);
            let parsed: Amount = amount.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed, amount);
        }
    }
}
