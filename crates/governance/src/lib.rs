//! Tollgate Governance Handlers
//!
//! Enactment side of governance for the economics modules:
//! - message-type exclusion and re-inclusion for the system fee
//! - parameter changes for the `fee` and `mint` subspaces, validated on write
//! - genesis import and export of all economics state
//!
//! Proposal submission and voting happen elsewhere; these handlers run
//! only once a proposal has passed.

pub mod errors;
pub mod exclusion;
pub mod genesis;
pub mod params;
pub mod proposal;

pub use errors::{GovernanceError, Result};
pub use exclusion::{ExcludeMessageTypeProposal, IncludeMessageTypeProposal};
pub use genesis::{FeeGenesis, GenesisState, MintGenesis};
pub use params::{ParamChange, ParamChangeProposal, ParamsKeeper};
pub use proposal::{validate_message_type, GovernanceHandler, Proposal, ProposalContent};
