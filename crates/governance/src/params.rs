//! Parameter store access and parameter-change proposals.

use crate::errors::{GovernanceError, Result};
use crate::proposal::{validate_text, ProposalContent};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tollgate_fees::params::{validate_maximum_fee, validate_minimum_fee, validate_percentage};
use tollgate_fees::FeeParams;
use tollgate_mint::params::{validate_inflation_rate, validate_max_accrual_seconds};
use tollgate_mint::MintParams;
use tollgate_storage::KvStore;
use tollgate_types::{validate_denom, CoinSet, Event, EventManager, EVENT_PARAM_CHANGE};
use tracing::info;

pub const FEE_SUBSPACE: &str = tollgate_fees::PARAMS_SUBSPACE;
pub const MINT_SUBSPACE: &str = tollgate_mint::PARAMS_SUBSPACE;

/// One `subspace/key = value` update. `value` is JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub subspace: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChangeProposal {
    pub title: String,
    pub description: String,
    pub changes: Vec<ParamChange>,
}

impl ProposalContent for ParamChangeProposal {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn proposal_type(&self) -> &'static str {
        "ParameterChange"
    }

    fn validate_basic(&self) -> Result<()> {
        validate_text(&self.title, &self.description)?;
        if self.changes.is_empty() {
            return Err(GovernanceError::InvalidProposal(
                "parameter change proposal has no changes".into(),
            ));
        }
        for change in &self.changes {
            if change.subspace.is_empty() || change.key.is_empty() {
                return Err(GovernanceError::InvalidProposal(
                    "parameter change needs a subspace and a key".into(),
                ));
            }
        }
        Ok(())
    }
}

impl ParamChangeProposal {
    /// Applies every change or none: all values are checked against a
    /// working copy before anything is written.
    pub fn apply<S: KvStore>(&self, keeper: &ParamsKeeper<S>, events: &mut EventManager) -> Result<()> {
        let mut fee = keeper.fee_params()?;
        let mut mint = keeper.mint_params()?;
        for change in &self.changes {
            match change.subspace.as_str() {
                FEE_SUBSPACE => update_fee_params(&mut fee, change)?,
                MINT_SUBSPACE => update_mint_params(&mut mint, change)?,
                other => return Err(GovernanceError::UnknownSubspace(other.to_string())),
            }
        }
        keeper.set_fee_params(&fee)?;
        keeper.set_mint_params(&mint)?;

        for change in &self.changes {
            events.emit(
                Event::new(EVENT_PARAM_CHANGE)
                    .with_attribute("subspace", &change.subspace)
                    .with_attribute("key", &change.key)
                    .with_attribute("value", &change.value),
            );
            info!(
                target: "governance",
                subspace = %change.subspace,
                key = %change.key,
                value = %change.value,
                "parameter changed"
            );
        }
        Ok(())
    }
}

fn parse_value<T: DeserializeOwned>(change: &ParamChange) -> Result<T> {
    serde_json::from_str(&change.value).map_err(|e| invalid(change, e))
}

fn invalid(change: &ParamChange, reason: impl ToString) -> GovernanceError {
    GovernanceError::InvalidParameterValue {
        subspace: change.subspace.clone(),
        key: change.key.clone(),
        reason: reason.to_string(),
    }
}

fn unknown(change: &ParamChange) -> GovernanceError {
    GovernanceError::UnknownParameter {
        subspace: change.subspace.clone(),
        key: change.key.clone(),
    }
}

fn update_fee_params(params: &mut FeeParams, change: &ParamChange) -> Result<()> {
    match change.key.as_str() {
        "fee_percentage" => {
            let rate: Decimal = parse_value(change)?;
            validate_percentage(&rate).map_err(|e| invalid(change, e))?;
            params.fee_percentage = rate;
        }
        "minimum_fee" => {
            let fee: CoinSet = parse_value(change)?;
            validate_minimum_fee(&fee, &params.base_denom).map_err(|e| invalid(change, e))?;
            params.minimum_fee = fee;
        }
        "maximum_fee" => {
            let fee: CoinSet = parse_value(change)?;
            validate_maximum_fee(&fee, &params.base_denom).map_err(|e| invalid(change, e))?;
            params.maximum_fee = fee;
        }
        _ => return Err(unknown(change)),
    }
    Ok(())
}

fn update_mint_params(params: &mut MintParams, change: &ParamChange) -> Result<()> {
    match change.key.as_str() {
        "mint_denom" => {
            let denom: String = parse_value(change)?;
            validate_denom(&denom).map_err(|e| invalid(change, e))?;
            params.mint_denom = denom;
        }
        "per_second_inflation_rate" => {
            let rate: Decimal = parse_value(change)?;
            validate_inflation_rate(&rate).map_err(|e| invalid(change, e))?;
            params.per_second_inflation_rate = rate;
        }
        "max_accrual_seconds" => {
            let seconds: u64 = parse_value(change)?;
            validate_max_accrual_seconds(seconds).map_err(|e| invalid(change, e))?;
            params.max_accrual_seconds = seconds;
        }
        _ => return Err(unknown(change)),
    }
    Ok(())
}

/// Typed access to the `0x20` parameter key range.
pub struct ParamsKeeper<S> {
    store: S,
}

impl<S: KvStore> ParamsKeeper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn fee_params(&self) -> Result<FeeParams> {
        FeeParams::load(&self.store)?.ok_or(GovernanceError::MissingParams(FEE_SUBSPACE))
    }

    pub fn set_fee_params(&self, params: &FeeParams) -> Result<()> {
        params.validate()?;
        params.save(&self.store)?;
        Ok(())
    }

    pub fn mint_params(&self) -> Result<MintParams> {
        MintParams::load(&self.store)?.ok_or(GovernanceError::MissingParams(MINT_SUBSPACE))
    }

    pub fn set_mint_params(&self, params: &MintParams) -> Result<()> {
        params.validate()?;
        params.save(&self.store)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_storage::MemoryStore;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let keeper = ParamsKeeper::new(&store);
        keeper.set_fee_params(&FeeParams::default()).unwrap();
        keeper.set_mint_params(&MintParams::default()).unwrap();
        store
    }

    fn proposal(changes: &[(&str, &str, &str)]) -> ParamChangeProposal {
        ParamChangeProposal {
            title: "Tune economics".into(),
            description: "Adjust parameters".into(),
            changes: changes
                .iter()
                .map(|(s, k, v)| ParamChange {
                    subspace: s.to_string(),
                    key: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn fee_percentage_change_applies() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        let mut events = EventManager::new();
        proposal(&[("fee", "fee_percentage", "\"0.01\"")])
            .apply(&keeper, &mut events)
            .unwrap();
        assert_eq!(keeper.fee_params().unwrap().fee_percentage, Decimal::new(1, 2));
        assert_eq!(events.events()[0].attribute("key"), Some("fee_percentage"));
    }

    #[test]
    fn out_of_range_percentage_rejected() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        let err = proposal(&[("fee", "fee_percentage", "\"1.5\"")])
            .apply(&keeper, &mut EventManager::new())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameterValue { .. }));
    }

    #[test]
    fn minimum_fee_must_carry_base_denom() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        let err = proposal(&[("fee", "minimum_fee", r#"[{"denom":"uatom","amount":"5"}]"#)])
            .apply(&keeper, &mut EventManager::new())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameterValue { .. }));

        proposal(&[("fee", "maximum_fee", r#"[{"denom":"utoll","amount":"5000"}]"#)])
            .apply(&keeper, &mut EventManager::new())
            .unwrap();
        assert_eq!(
            keeper.fee_params().unwrap().maximum_fee.to_string(),
            "5000utoll"
        );
    }

    #[test]
    fn failing_change_leaves_earlier_changes_unwritten() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        let err = proposal(&[
            ("mint", "max_accrual_seconds", "60"),
            ("mint", "per_second_inflation_rate", "\"-1\""),
        ])
        .apply(&keeper, &mut EventManager::new())
        .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameterValue { .. }));
        assert_eq!(
            keeper.mint_params().unwrap().max_accrual_seconds,
            tollgate_mint::DEFAULT_MAX_ACCRUAL_SECONDS
        );
    }

    #[test]
    fn inflation_rate_of_one_rejected() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        let err = proposal(&[("mint", "per_second_inflation_rate", "\"1\"")])
            .apply(&keeper, &mut EventManager::new())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameterValue { .. }));
        assert_eq!(keeper.mint_params().unwrap(), MintParams::default());
    }

    #[test]
    fn unknown_subspace_and_key_rejected() {
        let store = seeded();
        let keeper = ParamsKeeper::new(&store);
        assert!(matches!(
            proposal(&[("staking", "bond_denom", "\"x\"")])
                .apply(&keeper, &mut EventManager::new()),
            Err(GovernanceError::UnknownSubspace(_))
        ));
        assert!(matches!(
            proposal(&[("fee", "base_denom", "\"uatom\"")])
                .apply(&keeper, &mut EventManager::new()),
            Err(GovernanceError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn keeper_refuses_invalid_params() {
        let store = MemoryStore::new();
        let keeper = ParamsKeeper::new(&store);
        let bad = FeeParams {
            fee_percentage: Decimal::new(2, 0),
            ..FeeParams::default()
        };
        assert!(matches!(
            keeper.set_fee_params(&bad),
            Err(GovernanceError::FeeParams(_))
        ));
        assert!(matches!(
            keeper.fee_params(),
            Err(GovernanceError::MissingParams("fee"))
        ));
    }
}
