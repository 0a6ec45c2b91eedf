//! Block-start minting hook.

use crate::accrual::accrue;
use crate::distribution::{Distribution, SupplyDistributor};
use crate::params::MintParams;
use crate::state::MinterState;
use num_bigint::BigUint;
use num_traits::Zero;
use tollgate_storage::KvStore;
use tollgate_types::{
    module_accounts, BankKeeper, BlockTime, CoinSet, ConsensusFault, Dec, Event, EventManager,
    ATTR_MINTED_AMOUNT, EVENT_MINT,
};
use tracing::{debug, info};

/// Outcome of the block-start hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMint {
    pub height: u64,
    pub elapsed_seconds: u64,
    pub minted: BigUint,
    pub distribution: Distribution,
    pub leftover: Dec,
}

pub struct Minter<S> {
    store: S,
    distributor: SupplyDistributor,
}

impl<S: KvStore> Minter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            distributor: SupplyDistributor::default(),
        }
    }

    pub fn state(&self) -> Result<MinterState, ConsensusFault> {
        let state = MinterState::load(&self.store)
            .map_err(|e| ConsensusFault::Storage(e.to_string()))?
            .ok_or_else(|| ConsensusFault::CorruptState("minter state missing".into()))?;
        state.validate().map_err(ConsensusFault::CorruptState)?;
        Ok(state)
    }

    fn persist(&self, state: &MinterState) -> Result<(), ConsensusFault> {
        state
            .save(&self.store)
            .map_err(|e| ConsensusFault::Storage(e.to_string()))
    }

    /// Run once per block before any transaction.
    ///
    /// Height 1 only records the block time. Later heights require
    /// `time` to be strictly after the previous block, accrue whole
    /// elapsed seconds, mint the integer part and hand it to the pools.
    pub fn begin_block<B: BankKeeper + ?Sized>(
        &self,
        height: u64,
        time: BlockTime,
        params: &MintParams,
        bank: &mut B,
        events: &mut EventManager,
    ) -> Result<BlockMint, ConsensusFault> {
        params
            .validate()
            .map_err(|e| ConsensusFault::InvalidParams(e.to_string()))?;
        let rate = params
            .rate()
            .map_err(|e| ConsensusFault::InvalidParams(e.to_string()))?;
        let mut state = self.state()?;

        if height == 1 {
            state.previous_mint_time = time;
            self.persist(&state)?;
            debug!(target: "mint", %time, "recorded genesis block time");
            return Ok(BlockMint {
                height,
                leftover: state.leftover,
                ..BlockMint::default()
            });
        }

        let previous = state.previous_mint_time;
        let elapsed_seconds = time
            .whole_seconds_since(previous)
            .ok_or(ConsensusFault::NonMonotonicTime {
                previous,
                current: time,
            })?;
        if elapsed_seconds > params.max_accrual_seconds {
            return Err(ConsensusFault::ElapsedTimeOutOfBounds {
                elapsed: elapsed_seconds,
                limit: params.max_accrual_seconds,
            });
        }

        let supply = bank.total_supply().amount_of(&params.mint_denom);
        let accrual = accrue(&supply, &rate, &state.leftover, elapsed_seconds);

        state.previous_mint_time = time;
        state.leftover = accrual.leftover.clone();
        self.persist(&state)?;

        let distribution = if accrual.minted.is_zero() {
            Distribution::default()
        } else {
            let coins = CoinSet::single(&params.mint_denom, accrual.minted.clone())
                .map_err(|e| ConsensusFault::InvalidParams(e.to_string()))?;
            bank.mint_coins(module_accounts::MINTER, &coins)
                .map_err(|source| ConsensusFault::MintFailed {
                    amount: coins.clone(),
                    source,
                })?;
            self.distributor
                .distribute(bank, &params.mint_denom, &accrual.minted)?
        };

        events.emit(Event::new(EVENT_MINT).with_attribute(ATTR_MINTED_AMOUNT, &accrual.minted));
        info!(
            target: "mint",
            height,
            elapsed_seconds,
            minted = %accrual.minted,
            leftover = %accrual.leftover,
            "minted block inflation"
        );

        Ok(BlockMint {
            height,
            elapsed_seconds,
            minted: accrual.minted,
            distribution,
            leftover: accrual.leftover,
        })
    }
}
