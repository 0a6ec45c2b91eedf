//! Per-transaction fee assessment.
//!
//! The assessor decides how much value a transaction must be able to
//! cover and collects the system surcharge. It never moves the intrinsic
//! message value: each message handler does that itself later in the
//! pipeline. The only state it touches is the surcharge transfer, so a
//! rejected transaction leaves nothing behind.

use crate::exclusion::ExclusionRegistry;
use crate::schedule::FeeSchedule;
use thiserror::Error;
use tollgate_storage::{KvStore, StorageError};
use tollgate_types::{
    module_accounts, Address, BankError, BankKeeper, CoinError, CoinSet, Event, EventManager,
    Message, Transaction, TxError, ATTR_SYSTEM_FEE, ATTR_TOTAL_FEE, EVENT_FEE_ASSESSED,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameLookupError {
    #[error("name {0:?} is not registered")]
    Unknown(String),
    #[error("name {0:?} is not for sale")]
    NotForSale(String),
}

/// Read-only oracle over the name / credit registry.
pub trait NameRegistry {
    fn owned_name_count(&self, owner: &Address) -> u64;
    /// Remaining address-registration credits; may be negative.
    fn credits(&self, owner: &Address) -> i64;
    /// Credits granted to an account when it acquires its first name.
    fn standard_credit_grant(&self) -> i64;
    fn price_of(&self, name: &str) -> Result<CoinSet, NameLookupError>;
    fn name_registration_fee(&self) -> CoinSet;
    fn name_renewal_fee(&self) -> CoinSet;
    fn address_registration_fee(&self) -> CoinSet;
}

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("malformed transaction: {0}")]
    Malformed(#[from] TxError),
    #[error("price lookup failed for {name:?}: {source}")]
    PriceLookup {
        name: String,
        #[source]
        source: NameLookupError,
    },
    #[error("insufficient funds to cover fees: required {required}")]
    InsufficientFunds { required: CoinSet },
    #[error("system fee transfer failed: {0}")]
    FeeTransfer(#[source] BankError),
    #[error("fee arithmetic failed: {0}")]
    Coin(#[from] CoinError),
    #[error("exclusion registry unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// Amounts computed for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeAssessment {
    /// Intrinsic value carried by the messages; moved by their handlers.
    pub tx_fees: CoinSet,
    /// Surcharge collected into the fee collector during admission.
    pub system_fees: CoinSet,
    /// `tx_fees + system_fees`; what the payer must hold.
    pub total: CoinSet,
}

/// Transaction-scoped copy of the payer's registry counters. Adjusted while
/// walking the messages and dropped afterwards.
#[derive(Debug, Clone, Copy)]
struct PayerScratch {
    owned_names: u64,
    credits: i64,
}

impl PayerScratch {
    fn acquire_first_name<N: NameRegistry + ?Sized>(&mut self, names: &N) {
        if self.owned_names == 0 {
            self.owned_names = 1;
            self.credits = names.standard_credit_grant();
        }
    }

    fn release_last_name(&mut self) {
        if self.owned_names == 1 {
            self.owned_names = 0;
            self.credits = 0;
        }
    }
}

pub struct FeeAssessor<'a, S> {
    schedule: &'a FeeSchedule,
    exclusions: &'a ExclusionRegistry<S>,
}

impl<'a, S: KvStore> FeeAssessor<'a, S> {
    pub fn new(schedule: &'a FeeSchedule, exclusions: &'a ExclusionRegistry<S>) -> Self {
        Self {
            schedule,
            exclusions,
        }
    }

    /// Price `tx` without touching balances.
    pub fn compute<N: NameRegistry + ?Sized>(
        &self,
        tx: &Transaction,
        names: &N,
    ) -> Result<FeeAssessment, AdmissionError> {
        tx.validate_basic()?;

        let mut scratch = PayerScratch {
            owned_names: names.owned_name_count(&tx.fee_payer),
            credits: names.credits(&tx.fee_payer),
        };
        let mut tx_fees = CoinSet::new();
        let mut system_fees = CoinSet::new();

        for msg in &tx.messages {
            let msg_fee = message_fee(msg, names, &mut scratch)?;
            tx_fees += &msg_fee;

            if !self.exclusions.is_excluded(msg.type_url())? {
                let surcharge = self.schedule.system_fee(&msg_fee)?;
                system_fees += &surcharge;
            }
        }

        let total = &tx_fees + &system_fees;
        Ok(FeeAssessment {
            tx_fees,
            system_fees,
            total,
        })
    }

    /// Admit `tx`: price it, check the payer can cover the total, and move
    /// the system surcharge to the fee collector.
    pub fn assess<B, N>(
        &self,
        tx: &Transaction,
        bank: &mut B,
        names: &N,
        events: &mut EventManager,
    ) -> Result<FeeAssessment, AdmissionError>
    where
        B: BankKeeper + ?Sized,
        N: NameRegistry + ?Sized,
    {
        let assessment = self.compute(tx, names)?;

        if !bank.has_at_least(&tx.fee_payer, &assessment.total) {
            warn!(
                target: "fees",
                payer = %tx.fee_payer,
                required = %assessment.total,
                "rejecting transaction: insufficient funds for fees"
            );
            return Err(AdmissionError::InsufficientFunds {
                required: assessment.total,
            });
        }

        if !assessment.system_fees.is_empty() {
            bank.send_to_module(
                &tx.fee_payer,
                module_accounts::FEE_COLLECTOR,
                &assessment.system_fees,
            )
            .map_err(AdmissionError::FeeTransfer)?;
        }

        events.emit(
            Event::new(EVENT_FEE_ASSESSED)
                .with_attribute(ATTR_TOTAL_FEE, &assessment.total)
                .with_attribute(ATTR_SYSTEM_FEE, &assessment.system_fees),
        );
        debug!(
            target: "fees",
            payer = %tx.fee_payer,
            total = %assessment.total,
            system = %assessment.system_fees,
            "fees assessed"
        );

        Ok(assessment)
    }
}

fn message_fee<N: NameRegistry + ?Sized>(
    msg: &Message,
    names: &N,
    scratch: &mut PayerScratch,
) -> Result<CoinSet, AdmissionError> {
    let fee = match msg {
        Message::RegisterName { .. } => {
            scratch.acquire_first_name(names);
            names.name_registration_fee()
        }
        Message::RenewName { .. } => names.name_renewal_fee(),
        Message::BuyName { name, .. } => {
            let price = names
                .price_of(name)
                .map_err(|source| AdmissionError::PriceLookup {
                    name: name.clone(),
                    source,
                })?;
            scratch.acquire_first_name(names);
            price
        }
        Message::RegisterAddress { .. } => {
            let fee = if scratch.credits <= 0 {
                names.address_registration_fee()
            } else {
                CoinSet::new()
            };
            scratch.credits = scratch.credits.saturating_sub(1);
            fee
        }
        Message::TransferName { .. } | Message::DeleteName { .. } => {
            scratch.release_last_name();
            CoinSet::new()
        }
        Message::Send { amount, .. } | Message::CreateSellOrder { amount, .. } => amount.clone(),
        Message::MultiSend { inputs, .. } => inputs
            .iter()
            .fold(CoinSet::new(), |acc, input| &acc + &input.coins),
        Message::Other { .. } => CoinSet::new(),
    };
    Ok(fee)
}
