//! Percentage surcharge and clamping.

use crate::params::{FeeParams, FeeParamsError};
use num_bigint::BigUint;
use tollgate_types::{CoinError, CoinSet};

/// Validated view over [`FeeParams`] used during admission.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    params: FeeParams,
}

impl FeeSchedule {
    pub fn new(params: FeeParams) -> Result<Self, FeeParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FeeParams {
        &self.params
    }

    /// `floor(msg_fee[base_denom] * fee_percentage)` in the base
    /// denomination. Other denominations of `msg_fee` are ignored.
    pub fn percentage_fee(&self, msg_fee: &CoinSet) -> Result<CoinSet, CoinError> {
        let rate = &self.params.fee_percentage;
        let base = msg_fee.amount_of(&self.params.base_denom);
        let numerator = base * BigUint::from(rate.mantissa().unsigned_abs());
        let denominator = BigUint::from(10u32).pow(rate.scale());
        CoinSet::single(&self.params.base_denom, numerator / denominator)
    }

    /// Bound `fee` into `[minimum_fee, maximum_fee]` using the pairwise
    /// comparisons of [`CoinSet`].
    pub fn clamp(&self, fee: CoinSet) -> CoinSet {
        if fee.all_less_than(&self.params.minimum_fee) {
            self.params.minimum_fee.clone()
        } else if fee.all_greater_than(&self.params.maximum_fee) {
            self.params.maximum_fee.clone()
        } else {
            fee
        }
    }

    /// Clamped system surcharge owed for a message whose value is `msg_fee`.
    pub fn system_fee(&self, msg_fee: &CoinSet) -> Result<CoinSet, CoinError> {
        Ok(self.clamp(self.percentage_fee(msg_fee)?))
    }
}
