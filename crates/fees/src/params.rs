use num_traits::Zero;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_storage::{keys, KvStore, KvStoreExt, StorageError};
use tollgate_types::{validate_denom, CoinError, CoinSet};

/// Parameter-store subspace owned by the fee module.
pub const PARAMS_SUBSPACE: &str = "fee";
pub const DEFAULT_BASE_DENOM: &str = "utoll";

const DEFAULT_MINIMUM_FEE: u64 = 200;
const DEFAULT_MAXIMUM_FEE: u64 = 1_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeParamsError {
    #[error("fee percentage {0} must lie in [0, 1]")]
    PercentageOutOfRange(Decimal),
    #[error("minimum fee {fee} must hold a positive amount of {base_denom}")]
    MinimumNotPositive { fee: CoinSet, base_denom: String },
    #[error("maximum fee {fee} must hold a positive amount of {base_denom}")]
    MaximumNotPositive { fee: CoinSet, base_denom: String },
    #[error("invalid base denomination: {0}")]
    BaseDenom(#[from] CoinError),
}

/// Governance-controlled fee policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    /// Surcharge rate applied to the base-denomination value of a message.
    pub fee_percentage: Decimal,
    pub minimum_fee: CoinSet,
    pub maximum_fee: CoinSet,
    pub base_denom: String,
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            fee_percentage: Decimal::new(2, 3),
            minimum_fee: single(DEFAULT_BASE_DENOM, DEFAULT_MINIMUM_FEE),
            maximum_fee: single(DEFAULT_BASE_DENOM, DEFAULT_MAXIMUM_FEE),
            base_denom: DEFAULT_BASE_DENOM.to_string(),
        }
    }
}

fn single(denom: &str, amount: u64) -> CoinSet {
    CoinSet::single(denom, amount).unwrap_or_default()
}

impl FeeParams {
    pub fn validate(&self) -> Result<(), FeeParamsError> {
        validate_denom(&self.base_denom)?;
        validate_percentage(&self.fee_percentage)?;
        validate_minimum_fee(&self.minimum_fee, &self.base_denom)?;
        validate_maximum_fee(&self.maximum_fee, &self.base_denom)?;
        Ok(())
    }

    pub fn load<S: KvStore + ?Sized>(store: &S) -> Result<Option<Self>, StorageError> {
        store.get_json(&keys::params_key(PARAMS_SUBSPACE))
    }

    pub fn save<S: KvStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        store.set_json(&keys::params_key(PARAMS_SUBSPACE), self)
    }
}

pub fn validate_percentage(rate: &Decimal) -> Result<(), FeeParamsError> {
    if *rate < Decimal::ZERO || *rate > Decimal::ONE {
        return Err(FeeParamsError::PercentageOutOfRange(*rate));
    }
    Ok(())
}

pub fn validate_minimum_fee(fee: &CoinSet, base_denom: &str) -> Result<(), FeeParamsError> {
    if fee.amount_of(base_denom).is_zero() {
        return Err(FeeParamsError::MinimumNotPositive {
            fee: fee.clone(),
            base_denom: base_denom.to_string(),
        });
    }
    Ok(())
}

/// Same shape as [`validate_minimum_fee`]; `maximum >= minimum` is not
/// checked.
pub fn validate_maximum_fee(fee: &CoinSet, base_denom: &str) -> Result<(), FeeParamsError> {
    if fee.amount_of(base_denom).is_zero() {
        return Err(FeeParamsError::MaximumNotPositive {
            fee: fee.clone(),
            base_denom: base_denom.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tollgate_storage::MemoryStore;

    #[test]
    fn defaults_are_valid() {
        let params = FeeParams::default();
        params.validate().unwrap();
        assert_eq!(params.minimum_fee.to_string(), "200utoll");
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage(&Decimal::ZERO).is_ok());
        assert!(validate_percentage(&Decimal::ONE).is_ok());
        assert!(validate_percentage(&Decimal::from_str("1.0001").unwrap()).is_err());
        assert!(validate_percentage(&Decimal::from_str("-0.1").unwrap()).is_err());
    }

    #[test]
    fn minimum_needs_base_denom() {
        let mut params = FeeParams::default();
        params.minimum_fee = "50uatom".parse().unwrap();
        assert!(matches!(
            params.validate(),
            Err(FeeParamsError::MinimumNotPositive { .. })
        ));
    }

    #[test]
    fn maximum_below_minimum_is_accepted() {
        let mut params = FeeParams::default();
        params.maximum_fee = "100utoll".parse().unwrap();
        assert!(params.validate().is_ok());
    }

    #[test]
    fn persisted_under_fee_subspace() {
        let store = MemoryStore::new();
        assert_eq!(FeeParams::load(&store).unwrap(), None);
        let params = FeeParams::default();
        params.save(&store).unwrap();
        assert_eq!(FeeParams::load(&store).unwrap(), Some(params));
    }
}
