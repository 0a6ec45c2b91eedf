//! Exclude / include message types from the system fee.

use crate::errors::Result;
use crate::proposal::{validate_message_type, validate_text, ProposalContent};
use serde::{Deserialize, Serialize};
use tollgate_fees::ExclusionRegistry;
use tollgate_storage::KvStore;
use tollgate_types::{
    Event, EventManager, ATTR_DESCRIPTION, ATTR_MESSAGE_TYPE, ATTR_TITLE,
    EVENT_EXCLUDE_MESSAGE_TYPE, EVENT_INCLUDE_MESSAGE_TYPE,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeMessageTypeProposal {
    pub title: String,
    pub description: String,
    pub message_type: String,
}

/// Undoes an earlier exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeMessageTypeProposal {
    pub title: String,
    pub description: String,
    pub message_type: String,
}

fn audit_event(kind: &str, title: &str, description: &str, message_type: &str) -> Event {
    Event::new(kind)
        .with_attribute(ATTR_TITLE, title)
        .with_attribute(ATTR_DESCRIPTION, description)
        .with_attribute(ATTR_MESSAGE_TYPE, message_type)
}

impl ProposalContent for ExcludeMessageTypeProposal {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn proposal_type(&self) -> &'static str {
        "ExcludeMessageType"
    }

    fn validate_basic(&self) -> Result<()> {
        validate_text(&self.title, &self.description)?;
        validate_message_type(&self.message_type)
    }
}

impl ExcludeMessageTypeProposal {
    pub fn apply<S: KvStore>(
        &self,
        registry: &ExclusionRegistry<S>,
        events: &mut EventManager,
    ) -> Result<()> {
        registry.add(&self.message_type)?;
        events.emit(audit_event(
            EVENT_EXCLUDE_MESSAGE_TYPE,
            &self.title,
            &self.description,
            &self.message_type,
        ));
        info!(
            target: "governance",
            message_type = %self.message_type,
            "message type excluded from system fee"
        );
        Ok(())
    }
}

impl ProposalContent for IncludeMessageTypeProposal {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn proposal_type(&self) -> &'static str {
        "IncludeMessageType"
    }

    fn validate_basic(&self) -> Result<()> {
        validate_text(&self.title, &self.description)?;
        validate_message_type(&self.message_type)
    }
}

impl IncludeMessageTypeProposal {
    /// Including a type that is not excluded succeeds without change.
    pub fn apply<S: KvStore>(
        &self,
        registry: &ExclusionRegistry<S>,
        events: &mut EventManager,
    ) -> Result<()> {
        registry.remove(&self.message_type)?;
        events.emit(audit_event(
            EVENT_INCLUDE_MESSAGE_TYPE,
            &self.title,
            &self.description,
            &self.message_type,
        ));
        info!(
            target: "governance",
            message_type = %self.message_type,
            "message type subject to system fee again"
        );
        Ok(())
    }
}
