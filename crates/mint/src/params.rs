use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tollgate_storage::{keys, KvStore, KvStoreExt, StorageError};
use tollgate_types::{validate_denom, CoinError, Dec, DecError};

/// Parameter-store subspace owned by the mint module.
pub const PARAMS_SUBSPACE: &str = "mint";
/// One week.
pub const DEFAULT_MAX_ACCRUAL_SECONDS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_MINT_DENOM: &str = "utoll";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MintParamsError {
    #[error("invalid mint denomination: {0}")]
    Denom(#[from] CoinError),
    #[error("per-second inflation rate {0} must not be negative")]
    NegativeRate(Decimal),
    #[error("per-second inflation rate {0} must be below one")]
    RateTooHigh(Decimal),
    #[error("max accrual seconds must be positive")]
    ZeroAccrualBound,
    #[error("inflation rate is not representable: {0}")]
    Rate(#[from] DecError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintParams {
    pub mint_denom: String,
    /// Fraction of the current supply minted per elapsed second.
    pub per_second_inflation_rate: Decimal,
    /// Largest elapsed interval a single block may accrue for.
    #[serde(default = "default_max_accrual_seconds")]
    pub max_accrual_seconds: u64,
}

fn default_max_accrual_seconds() -> u64 {
    DEFAULT_MAX_ACCRUAL_SECONDS
}

impl Default for MintParams {
    fn default() -> Self {
        Self {
            mint_denom: DEFAULT_MINT_DENOM.to_string(),
            // roughly 3.2% per year
            per_second_inflation_rate: Decimal::new(1, 9),
            max_accrual_seconds: DEFAULT_MAX_ACCRUAL_SECONDS,
        }
    }
}

impl MintParams {
    pub fn validate(&self) -> Result<(), MintParamsError> {
        validate_denom(&self.mint_denom)?;
        validate_inflation_rate(&self.per_second_inflation_rate)?;
        validate_max_accrual_seconds(self.max_accrual_seconds)?;
        Ok(())
    }

    /// Rate as the fixed-point type used by accrual.
    pub fn rate(&self) -> Result<Dec, MintParamsError> {
        validate_inflation_rate(&self.per_second_inflation_rate)?;
        Ok(Dec::from_decimal(&self.per_second_inflation_rate)?)
    }

    pub fn load<S: KvStore + ?Sized>(store: &S) -> Result<Option<Self>, StorageError> {
        store.get_json(&keys::params_key(PARAMS_SUBSPACE))
    }

    pub fn save<S: KvStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        store.set_json(&keys::params_key(PARAMS_SUBSPACE), self)
    }
}

/// Accepts rates in `[0, 1)`. Each accrued second multiplies the running
/// estimate by `1 + rate`, so bigger rates make a long interval grow the
/// numbers at every step.
pub fn validate_inflation_rate(rate: &Decimal) -> Result<(), MintParamsError> {
    if *rate < Decimal::ZERO {
        return Err(MintParamsError::NegativeRate(*rate));
    }
    if *rate >= Decimal::ONE {
        return Err(MintParamsError::RateTooHigh(*rate));
    }
    Ok(())
}

pub fn validate_max_accrual_seconds(seconds: u64) -> Result<(), MintParamsError> {
    if seconds == 0 {
        return Err(MintParamsError::ZeroAccrualBound);
    }
    Ok(())
}
