use crate::ledger::NamePricing;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tollgate_governance::GenesisState;
use tollgate_types::{Address, BlockTime, CoinSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub coins: CoinSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisName {
    pub name: String,
    pub owner: Address,
    #[serde(default)]
    pub price: Option<CoinSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameServiceGenesis {
    #[serde(default)]
    pub registration_fee: CoinSet,
    #[serde(default)]
    pub renewal_fee: CoinSet,
    #[serde(default)]
    pub address_registration_fee: CoinSet,
    #[serde(default)]
    pub standard_credit_grant: i64,
    #[serde(default)]
    pub names: Vec<GenesisName>,
}

impl NameServiceGenesis {
    pub fn pricing(&self) -> NamePricing {
        NamePricing {
            registration_fee: self.registration_fee.clone(),
            renewal_fee: self.renewal_fee.clone(),
            address_registration_fee: self.address_registration_fee.clone(),
            standard_credit_grant: self.standard_credit_grant,
        }
    }
}

/// Genesis file consumed by the node: economics state plus the initial
/// balances and names held by the in-memory ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGenesis {
    #[serde(default)]
    pub genesis_time: BlockTime,
    #[serde(flatten)]
    pub economics: GenesisState,
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub names: NameServiceGenesis,
}

impl NodeGenesis {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading genesis file {}", path.display()))?;
        let genesis: NodeGenesis = serde_json::from_str(&raw)
            .with_context(|| format!("parsing genesis file {}", path.display()))?;
        Ok(genesis)
    }

    pub fn validate(&self) -> Result<()> {
        self.economics.validate()?;

        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account.address) {
                anyhow::bail!("duplicate genesis account {}", account.address);
            }
        }
        let mut names = BTreeSet::new();
        for entry in &self.names.names {
            if !names.insert(entry.name.as_str()) {
                anyhow::bail!("duplicate genesis name {:?}", entry.name);
            }
        }
        if self.names.standard_credit_grant < 0 {
            anyhow::bail!("standard credit grant must not be negative");
        }
        Ok(())
    }
}
