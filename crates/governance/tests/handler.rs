//! Proposal enactment over a sled-backed store.

use tempfile::TempDir;
use tollgate_fees::ExclusionRegistry;
use tollgate_governance::{
    ExcludeMessageTypeProposal, GenesisState, GovernanceError, GovernanceHandler,
    IncludeMessageTypeProposal, ParamChange, ParamChangeProposal, ParamsKeeper, Proposal,
};
use tollgate_storage::SledStore;
use tollgate_types::{EventManager, EVENT_EXCLUDE_MESSAGE_TYPE, EVENT_PARAM_CHANGE};

fn store() -> (TempDir, SledStore) {
    let dir = TempDir::new().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    GenesisState::default().init(&store).unwrap();
    (dir, store)
}

#[test]
fn handler_dispatches_each_kind() {
    let (_dir, store) = store();
    let handler = GovernanceHandler::new(&store);
    let mut events = EventManager::new();

    handler
        .handle(
            &Proposal::ExcludeMessageType(ExcludeMessageTypeProposal {
                title: "Free sell orders".into(),
                description: "Market makers pay no surcharge".into(),
                message_type: "market/CreateSellOrder".into(),
            }),
            &mut events,
        )
        .unwrap();
    handler
        .handle(
            &Proposal::ParamChange(ParamChangeProposal {
                title: "Cheaper minimum".into(),
                description: "Lower the surcharge floor".into(),
                changes: vec![ParamChange {
                    subspace: "fee".into(),
                    key: "minimum_fee".into(),
                    value: r#"[{"denom":"utoll","amount":"100"}]"#.into(),
                }],
            }),
            &mut events,
        )
        .unwrap();

    assert!(ExclusionRegistry::new(&store)
        .is_excluded("market/CreateSellOrder")
        .unwrap());
    assert_eq!(
        ParamsKeeper::new(&store)
            .fee_params()
            .unwrap()
            .minimum_fee
            .to_string(),
        "100utoll"
    );
    assert_eq!(events.of_kind(EVENT_EXCLUDE_MESSAGE_TYPE).count(), 1);
    assert_eq!(events.of_kind(EVENT_PARAM_CHANGE).count(), 1);
}

#[test]
fn invalid_proposal_has_no_effect() {
    let (_dir, store) = store();
    let handler = GovernanceHandler::new(&store);
    let mut events = EventManager::new();

    let err = handler
        .handle(
            &Proposal::IncludeMessageType(IncludeMessageTypeProposal {
                title: "x".repeat(141),
                description: "too long a title".into(),
                message_type: "bank/Send".into(),
            }),
            &mut events,
        )
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidProposal(_)));
    assert!(events.is_empty());
}

#[test]
fn proposals_round_trip_through_json() {
    let proposal = Proposal::ExcludeMessageType(ExcludeMessageTypeProposal {
        title: "t".into(),
        description: "d".into(),
        message_type: "bank/Send".into(),
    });
    let json = serde_json::to_string(&proposal).unwrap();
    assert!(json.contains("\"kind\":\"exclude_message_type\""));
    assert_eq!(serde_json::from_str::<Proposal>(&json).unwrap(), proposal);
}

#[test]
fn exported_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = SledStore::open(dir.path()).unwrap();
        let mut genesis = GenesisState::default();
        genesis.fee.excluded_message_types = vec!["bank/Send".into()];
        genesis.init(&store).unwrap();
        store.flush().unwrap();
    }
    let store = SledStore::open(dir.path()).unwrap();
    let exported = GenesisState::export(&store).unwrap();
    assert_eq!(exported.fee.excluded_message_types, vec!["bank/Send"]);
}
