//! Unrecoverable consensus faults.
//!
//! A [`ConsensusFault`] means replicas could diverge if processing
//! continued. It is deliberately a separate type from every admission or
//! configuration error: callers must halt block production on it and never
//! retry or skip the block.

use crate::{BankError, BlockTime, CoinSet};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConsensusFault {
    #[error("block time {current} does not advance past previous mint time {previous}")]
    NonMonotonicTime {
        previous: BlockTime,
        current: BlockTime,
    },
    #[error("{elapsed}s elapsed since the previous block exceeds the accrual bound of {limit}s")]
    ElapsedTimeOutOfBounds { elapsed: u64, limit: u64 },
    #[error("minting {amount} failed: {source}")]
    MintFailed {
        amount: CoinSet,
        #[source]
        source: BankError,
    },
    #[error("moving {amount} from {from} to {to} failed: {source}")]
    DistributionFailed {
        from: String,
        to: String,
        amount: CoinSet,
        #[source]
        source: BankError,
    },
    #[error("minter state is corrupt: {0}")]
    CorruptState(String),
    #[error("state persistence failed: {0}")]
    Storage(String),
    #[error("invalid mint parameters reached block processing: {0}")]
    InvalidParams(String),
}
