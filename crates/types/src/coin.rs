//! Multi-denomination amount algebra.
//!
//! A [`CoinSet`] maps denominations to non-negative arbitrary-precision
//! amounts. Entries are kept sorted by denomination and zero amounts are
//! never stored, so two sets holding the same value are always equal and
//! iterate in the same order on every node.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

const DENOM_MIN_LEN: usize = 3;
const DENOM_MAX_LEN: usize = 128;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CoinError {
    #[error("invalid denomination: {0:?}")]
    InvalidDenom(String),
    #[error("duplicate denomination: {0}")]
    DuplicateDenom(String),
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("malformed coin expression: {0:?}")]
    Malformed(String),
    #[error("insufficient {denom}: have {available}, need {requested}")]
    Insufficient {
        denom: String,
        available: BigUint,
        requested: BigUint,
    },
}

/// Check a denomination against `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let len_ok = (DENOM_MIN_LEN..=DENOM_MAX_LEN).contains(&denom.len());
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));

    if len_ok && first_ok && rest_ok {
        Ok(())
    } else {
        Err(CoinError::InvalidDenom(denom.to_string()))
    }
}

mod biguint_string {
    use num_bigint::BigUint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<BigUint>()
            .map_err(|_| D::Error::custom(format!("invalid amount {raw:?}")))
    }
}

/// A single denomination/amount pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "biguint_string")]
    pub amount: BigUint,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<BigUint>) -> Result<Self, CoinError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self {
            denom,
            amount: amount.into(),
        })
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinError::Malformed(s.to_string()))?;
        if split == 0 {
            return Err(CoinError::Malformed(s.to_string()));
        }
        let (amount, denom) = s.split_at(split);
        let amount = amount
            .parse::<BigUint>()
            .map_err(|_| CoinError::InvalidAmount(amount.to_string()))?;
        Coin::new(denom, amount)
    }
}

/// Sorted, zero-free collection of coins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct CoinSet(BTreeMap<String, BigUint>);

impl CoinSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a set from individual coins. Zero amounts are dropped;
    /// repeating a denomination is an error.
    pub fn from_coins<I: IntoIterator<Item = Coin>>(coins: I) -> Result<Self, CoinError> {
        let mut entries = BTreeMap::new();
        for coin in coins {
            validate_denom(&coin.denom)?;
            if entries.contains_key(&coin.denom) {
                return Err(CoinError::DuplicateDenom(coin.denom));
            }
            if !coin.amount.is_zero() {
                entries.insert(coin.denom, coin.amount);
            }
        }
        Ok(Self(entries))
    }

    /// Single-denomination set; empty when `amount` is zero.
    pub fn single(denom: &str, amount: impl Into<BigUint>) -> Result<Self, CoinError> {
        Self::from_coins([Coin::new(denom, amount)?])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Amount held in `denom`, zero when absent.
    pub fn amount_of(&self, denom: &str) -> BigUint {
        self.0.get(denom).cloned().unwrap_or_default()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BigUint)> {
        self.0.iter().map(|(d, a)| (d.as_str(), a))
    }

    pub fn to_coins(&self) -> Vec<Coin> {
        self.0
            .iter()
            .map(|(denom, amount)| Coin {
                denom: denom.clone(),
                amount: amount.clone(),
            })
            .collect()
    }

    /// Subtract `other`, failing if any denomination would go below zero.
    pub fn checked_sub(&self, other: &CoinSet) -> Result<CoinSet, CoinError> {
        let mut entries = self.0.clone();
        for (denom, requested) in &other.0 {
            let available = entries.get(denom).cloned().unwrap_or_default();
            if &available < requested {
                return Err(CoinError::Insufficient {
                    denom: denom.clone(),
                    available,
                    requested: requested.clone(),
                });
            }
            let remaining = available - requested;
            if remaining.is_zero() {
                entries.remove(denom);
            } else {
                entries.insert(denom.clone(), remaining);
            }
        }
        Ok(Self(entries))
    }

    /// `self[d] >= other[d]` for every denomination held by `other`.
    pub fn is_all_gte(&self, other: &CoinSet) -> bool {
        other
            .0
            .iter()
            .all(|(denom, amount)| &self.amount_of(denom) >= amount)
    }

    /// Strict pairwise dominance over the denominations of `other`.
    ///
    /// An empty `self` is never greater; anything non-empty is greater than
    /// the empty set. Otherwise every denomination of `other` must be held
    /// by `self` with a strictly larger amount.
    pub fn all_greater_than(&self, other: &CoinSet) -> bool {
        if self.is_empty() {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        if !other.denoms_subset_of(self) {
            return false;
        }
        other
            .0
            .iter()
            .all(|(denom, amount)| &self.amount_of(denom) > amount)
    }

    /// Mirror of [`CoinSet::all_greater_than`]: `other.all_greater_than(self)`.
    pub fn all_less_than(&self, other: &CoinSet) -> bool {
        other.all_greater_than(self)
    }

    fn denoms_subset_of(&self, other: &CoinSet) -> bool {
        self.len() <= other.len() && self.0.keys().all(|d| other.0.contains_key(d))
    }
}

impl AddAssign<&CoinSet> for CoinSet {
    fn add_assign(&mut self, other: &CoinSet) {
        for (denom, amount) in &other.0 {
            *self.0.entry(denom.clone()).or_default() += amount;
        }
    }
}

impl Add<&CoinSet> for &CoinSet {
    type Output = CoinSet;

    fn add(self, other: &CoinSet) -> CoinSet {
        let mut sum = self.clone();
        sum += other;
        sum
    }
}

impl TryFrom<Vec<Coin>> for CoinSet {
    type Error = CoinError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::from_coins(coins)
    }
}

impl From<CoinSet> for Vec<Coin> {
    fn from(set: CoinSet) -> Self {
        set.to_coins()
    }
}

impl fmt::Display for CoinSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for CoinSet {
    type Err = CoinError;

    /// Parse `"100utoll,5uatom"`. The empty string is the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        let coins = s
            .split(',')
            .map(Coin::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_coins(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coins(s: &str) -> CoinSet {
        s.parse().unwrap()
    }

    #[test]
    fn zero_amounts_are_dropped() {
        let set = CoinSet::single("utoll", 0u32).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "");
    }

    #[test]
    fn duplicate_denoms_rejected() {
        let err = CoinSet::from_coins([
            Coin::new("utoll", 1u32).unwrap(),
            Coin::new("utoll", 2u32).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(err, CoinError::DuplicateDenom("utoll".into()));
    }

    #[test]
    fn denom_validation() {
        assert!(validate_denom("utoll").is_ok());
        assert!(validate_denom("ibc/ABCDEF").is_ok());
        assert!(validate_denom("ut").is_err());
        assert!(validate_denom("1abc").is_err());
        assert!(validate_denom("ut oll").is_err());
    }

    #[test]
    fn add_merges_denominations() {
        let sum = &coins("100utoll,5uatom") + &coins("50utoll,7ufoo");
        assert_eq!(sum, coins("5uatom,150utoll,7ufoo"));
    }

    #[test]
    fn subtract_below_zero_fails() {
        let err = coins("100utoll").checked_sub(&coins("101utoll")).unwrap_err();
        assert!(matches!(err, CoinError::Insufficient { .. }));

        let err = coins("100utoll").checked_sub(&coins("1uatom")).unwrap_err();
        assert!(matches!(err, CoinError::Insufficient { .. }));

        let rest = coins("100utoll,3uatom").checked_sub(&coins("100utoll")).unwrap();
        assert_eq!(rest, coins("3uatom"));
    }

    #[test]
    fn greater_than_semantics() {
        assert!(coins("10utoll").all_greater_than(&coins("9utoll")));
        assert!(!coins("10utoll").all_greater_than(&coins("10utoll")));
        assert!(coins("10utoll").all_greater_than(&CoinSet::new()));
        assert!(!CoinSet::new().all_greater_than(&coins("1utoll")));
        assert!(!CoinSet::new().all_greater_than(&CoinSet::new()));
        // Denominations of the right operand must all be present on the left.
        assert!(!coins("10utoll").all_greater_than(&coins("1utoll,1uatom")));
        // Extra denominations on the left are ignored.
        assert!(coins("10utoll,1uatom").all_greater_than(&coins("9utoll")));
    }

    #[test]
    fn less_than_mirrors_greater_than() {
        assert!(coins("9utoll").all_less_than(&coins("10utoll")));
        assert!(CoinSet::new().all_less_than(&coins("200utoll")));
        assert!(!coins("200utoll").all_less_than(&coins("200utoll")));
    }

    #[test]
    fn display_and_parse() {
        let set = coins("150utoll,5uatom");
        assert_eq!(set.to_string(), "5uatom,150utoll");
        assert!("utoll".parse::<CoinSet>().is_err());
        assert!("12".parse::<CoinSet>().is_err());
    }

    #[test]
    fn json_amounts_are_strings() {
        let set = coins("340282366920938463463374607431768211456utoll");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"[{"denom":"utoll","amount":"340282366920938463463374607431768211456"}]"#
        );
        let back: CoinSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    fn arb_coins() -> impl Strategy<Value = CoinSet> {
        proptest::collection::btree_map(
            prop_oneof![Just("uatom"), Just("utoll"), Just("ufoo")],
            0u64..1_000_000,
            0..3,
        )
        .prop_map(|entries| {
            entries.into_iter().fold(CoinSet::new(), |acc, (denom, amount)| {
                &acc + &CoinSet::single(denom, amount).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn add_then_subtract_restores(a in arb_coins(), b in arb_coins()) {
            let sum = &a + &b;
            prop_assert!(sum.is_all_gte(&a));
            prop_assert_eq!(sum.checked_sub(&b).unwrap(), a);
        }

        #[test]
        fn greater_and_less_never_both_hold(a in arb_coins(), b in arb_coins()) {
            prop_assert!(!(a.all_greater_than(&b) && a.all_less_than(&b)));
        }
    }
}
