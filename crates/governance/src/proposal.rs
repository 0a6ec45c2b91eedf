//! Passed-proposal dispatch.

use crate::errors::{GovernanceError, Result};
use crate::exclusion::{ExcludeMessageTypeProposal, IncludeMessageTypeProposal};
use crate::params::{ParamChangeProposal, ParamsKeeper};
use serde::{Deserialize, Serialize};
use tollgate_fees::ExclusionRegistry;
use tollgate_storage::KvStore;
use tollgate_types::EventManager;
use tracing::debug;

pub const MAX_TITLE_LENGTH: usize = 140;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Common surface of every proposal kind.
pub trait ProposalContent {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn proposal_type(&self) -> &'static str;

    /// Stateless checks shared by every proposal; kinds extend this.
    fn validate_basic(&self) -> Result<()> {
        validate_text(self.title(), self.description())
    }
}

pub(crate) fn validate_text(title: &str, description: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(GovernanceError::InvalidProposal(
            "proposal title cannot be blank".into(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(GovernanceError::InvalidProposal(format!(
            "proposal title is longer than {MAX_TITLE_LENGTH} characters"
        )));
    }
    if description.trim().is_empty() {
        return Err(GovernanceError::InvalidProposal(
            "proposal description cannot be blank".into(),
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(GovernanceError::InvalidProposal(format!(
            "proposal description is longer than {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Accepts `<route>/<type>` with both halves non-empty and no whitespace.
pub fn validate_message_type(message_type: &str) -> Result<()> {
    let well_formed = match message_type.split_once('/') {
        Some((route, kind)) => {
            !route.is_empty()
                && !kind.is_empty()
                && !kind.contains('/')
                && !message_type.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(GovernanceError::InvalidProposal(format!(
            "message type {message_type:?} must have the form <route>/<type>"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    ExcludeMessageType(ExcludeMessageTypeProposal),
    IncludeMessageType(IncludeMessageTypeProposal),
    ParamChange(ParamChangeProposal),
}

impl Proposal {
    pub fn content(&self) -> &dyn ProposalContent {
        match self {
            Proposal::ExcludeMessageType(p) => p,
            Proposal::IncludeMessageType(p) => p,
            Proposal::ParamChange(p) => p,
        }
    }

    pub fn validate_basic(&self) -> Result<()> {
        self.content().validate_basic()
    }
}

/// Applies passed proposals to the state store.
pub struct GovernanceHandler<S> {
    store: S,
}

impl<S: KvStore> GovernanceHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn handle(&self, proposal: &Proposal, events: &mut EventManager) -> Result<()> {
        proposal.validate_basic()?;
        let content = proposal.content();
        debug!(
            target: "governance",
            proposal_type = content.proposal_type(),
            title = content.title(),
            "dispatching proposal"
        );
        match proposal {
            Proposal::ExcludeMessageType(p) => {
                p.apply(&ExclusionRegistry::new(&self.store), events)
            }
            Proposal::IncludeMessageType(p) => {
                p.apply(&ExclusionRegistry::new(&self.store), events)
            }
            Proposal::ParamChange(p) => p.apply(&ParamsKeeper::new(&self.store), events),
        }
    }
}
