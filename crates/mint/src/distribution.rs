//! Splitting freshly minted supply between the two destination pools.

use num_bigint::BigUint;
use num_traits::Zero;
use tollgate_types::{module_accounts, BankKeeper, CoinSet, ConsensusFault};
use tracing::debug;

/// Amounts sent to each pool for one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    pub to_treasury: BigUint,
    pub to_rewards: BigUint,
}

/// `(floor(m / 2), m - floor(m / 2))`: the rewards pool takes the odd unit.
pub fn split_minted(minted: &BigUint) -> Distribution {
    let to_treasury = minted / 2u32;
    let to_rewards = minted - &to_treasury;
    Distribution {
        to_treasury,
        to_rewards,
    }
}

/// Moves minted coins out of the mint module account into the pools.
#[derive(Debug, Clone)]
pub struct SupplyDistributor {
    source: &'static str,
    treasury_pool: &'static str,
    rewards_pool: &'static str,
}

impl Default for SupplyDistributor {
    fn default() -> Self {
        Self {
            source: module_accounts::MINTER,
            treasury_pool: module_accounts::TREASURY_POOL,
            rewards_pool: module_accounts::REWARDS_POOL,
        }
    }
}

impl SupplyDistributor {
    pub fn distribute<B: BankKeeper + ?Sized>(
        &self,
        bank: &mut B,
        denom: &str,
        minted: &BigUint,
    ) -> Result<Distribution, ConsensusFault> {
        let split = split_minted(minted);
        self.transfer(bank, self.treasury_pool, denom, &split.to_treasury)?;
        self.transfer(bank, self.rewards_pool, denom, &split.to_rewards)?;
        debug!(
            target: "mint",
            treasury = %split.to_treasury,
            rewards = %split.to_rewards,
            "distributed minted supply"
        );
        Ok(split)
    }

    fn transfer<B: BankKeeper + ?Sized>(
        &self,
        bank: &mut B,
        to: &str,
        denom: &str,
        amount: &BigUint,
    ) -> Result<(), ConsensusFault> {
        if amount.is_zero() {
            return Ok(());
        }
        let coins = CoinSet::single(denom, amount.clone())
            .map_err(|e| ConsensusFault::InvalidParams(e.to_string()))?;
        bank.send_module_to_module(self.source, to, &coins)
            .map_err(|source| ConsensusFault::DistributionFailed {
                from: self.source.to_string(),
                to: to.to_string(),
                amount: coins,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn odd_amount_favours_rewards_pool() {
        let split = split_minted(&BigUint::from(7u32));
        assert_eq!(split.to_treasury, BigUint::from(3u32));
        assert_eq!(split.to_rewards, BigUint::from(4u32));
    }

    #[test]
    fn single_unit_goes_to_rewards() {
        let split = split_minted(&BigUint::from(1u32));
        assert!(split.to_treasury.is_zero());
        assert_eq!(split.to_rewards, BigUint::from(1u32));
    }

    proptest! {
        #[test]
        fn split_conserves_and_orders(m in any::<u128>()) {
            let minted = BigUint::from(m);
            let split = split_minted(&minted);
            prop_assert_eq!(&split.to_treasury + &split.to_rewards, minted);
            prop_assert!(split.to_treasury <= split.to_rewards);
            prop_assert!(&split.to_rewards - &split.to_treasury <= BigUint::from(1u32));
        }
    }
}
