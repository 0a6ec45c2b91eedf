//! Tollgate minting
//!
//! Once per block, before any transaction runs, new supply accrues for
//! every whole second elapsed since the previous block. Accrual compounds
//! per second on a running supply estimate; the sub-unit remainder is
//! carried to the next block. The integer part is minted into the mint
//! module account and split between the treasury and rewards pools.
//!
//! Nothing here can reject a block. Every failure is a
//! [`tollgate_types::ConsensusFault`] and must halt the node.

pub mod accrual;
pub mod distribution;
pub mod minter;
pub mod params;
pub mod state;

pub use accrual::{accrue, Accrual};
pub use distribution::{split_minted, Distribution, SupplyDistributor};
pub use minter::{BlockMint, Minter};
pub use params::{MintParams, MintParamsError, DEFAULT_MAX_ACCRUAL_SECONDS, PARAMS_SUBSPACE};
pub use state::MinterState;
