//! Error types for the governance handlers

use thiserror::Error;
use tollgate_fees::FeeParamsError;
use tollgate_mint::MintParamsError;
use tollgate_storage::StorageError;

#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Stateless proposal checks failed
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("Unknown parameter subspace: {0}")]
    UnknownSubspace(String),

    #[error("Unknown parameter {key:?} in subspace {subspace:?}")]
    UnknownParameter { subspace: String, key: String },

    #[error("Invalid value for {subspace}/{key}: {reason}")]
    InvalidParameterValue {
        subspace: String,
        key: String,
        reason: String,
    },

    #[error("Parameters for subspace {0:?} have not been initialised")]
    MissingParams(&'static str),

    #[error("Invalid fee parameters: {0}")]
    FeeParams(#[from] FeeParamsError),

    #[error("Invalid mint parameters: {0}")]
    MintParams(#[from] MintParamsError),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;
