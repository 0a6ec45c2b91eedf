//! Genesis import and export for the economics modules.

use crate::errors::{GovernanceError, Result};
use crate::params::ParamsKeeper;
use crate::proposal::validate_message_type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tollgate_fees::{ExclusionRegistry, FeeParams};
use tollgate_mint::{MintParams, MinterState};
use tollgate_storage::KvStore;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeGenesis {
    pub params: FeeParams,
    #[serde(default)]
    pub excluded_message_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintGenesis {
    pub params: MintParams,
    #[serde(default)]
    pub minter: MinterState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub fee: FeeGenesis,
    pub mint: MintGenesis,
}

impl GenesisState {
    pub fn validate(&self) -> Result<()> {
        self.fee.params.validate()?;
        let mut seen = BTreeSet::new();
        for message_type in &self.fee.excluded_message_types {
            validate_message_type(message_type)
                .map_err(|e| GovernanceError::InvalidGenesis(e.to_string()))?;
            if !seen.insert(message_type.as_str()) {
                return Err(GovernanceError::InvalidGenesis(format!(
                    "duplicate excluded message type {message_type:?}"
                )));
            }
        }

        self.mint.params.validate()?;
        self.mint
            .minter
            .validate()
            .map_err(GovernanceError::InvalidGenesis)?;
        Ok(())
    }

    /// Validate and write every record into `store`.
    pub fn init<S: KvStore>(&self, store: &S) -> Result<()> {
        self.validate()?;

        let keeper = ParamsKeeper::new(store);
        keeper.set_fee_params(&self.fee.params)?;
        keeper.set_mint_params(&self.mint.params)?;

        let registry = ExclusionRegistry::new(store);
        for message_type in &self.fee.excluded_message_types {
            registry.add(message_type)?;
        }
        self.mint.minter.save(store)?;

        info!(
            target: "governance",
            excluded = self.fee.excluded_message_types.len(),
            mint_denom = %self.mint.params.mint_denom,
            "genesis state initialised"
        );
        Ok(())
    }

    /// Read the current economics state back out of `store`.
    pub fn export<S: KvStore>(store: &S) -> Result<Self> {
        let keeper = ParamsKeeper::new(store);
        let minter = MinterState::load(store)?.ok_or_else(|| {
            GovernanceError::InvalidGenesis("minter state has not been initialised".into())
        })?;
        Ok(Self {
            fee: FeeGenesis {
                params: keeper.fee_params()?,
                excluded_message_types: ExclusionRegistry::new(store).list_all()?,
            },
            mint: MintGenesis {
                params: keeper.mint_params()?,
                minter,
            },
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
