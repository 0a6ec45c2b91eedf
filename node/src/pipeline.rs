//! Per-block processing: mint at block start, then admit and execute
//! transactions in order.

use crate::ledger::{LedgerError, MemoryLedger};
use metrics::counter;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use thiserror::Error;
use tollgate_fees::{AdmissionError, ExclusionRegistry, FeeAssessor, FeeSchedule};
use tollgate_governance::ParamsKeeper;
use tollgate_mint::{BlockMint, Minter};
use tollgate_storage::KvStore;
use tollgate_types::{BlockTime, CoinSet, ConsensusFault, Event, EventManager, Transaction};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TxRejection {
    #[error("admission failed: {0}")]
    Admission(#[from] AdmissionError),
    #[error("message {index} failed: {source}")]
    Execution {
        index: usize,
        #[source]
        source: LedgerError,
    },
}

#[derive(Debug)]
pub struct RejectedTx {
    pub index: usize,
    pub reason: TxRejection,
}

#[derive(Debug)]
pub struct BlockOutcome {
    pub height: u64,
    pub time: BlockTime,
    pub mint: BlockMint,
    pub admitted: usize,
    pub rejected: Vec<RejectedTx>,
    /// System surcharges moved to the fee collector in this block.
    pub fees_collected: CoinSet,
    pub events: Vec<Event>,
}

pub struct Pipeline<S> {
    store: S,
    ledger: MemoryLedger,
}

impl<S: KvStore> Pipeline<S> {
    pub fn new(store: S, ledger: MemoryLedger) -> Self {
        Self { store, ledger }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    /// Run one block. A rejected transaction leaves no trace in the
    /// ledger; a fault aborts the block and must halt the node.
    pub fn process_block(
        &mut self,
        height: u64,
        time: BlockTime,
        txs: &[Transaction],
    ) -> Result<BlockOutcome, ConsensusFault> {
        let keeper = ParamsKeeper::new(&self.store);
        let mint_params = keeper
            .mint_params()
            .map_err(|e| ConsensusFault::CorruptState(e.to_string()))?;
        let fee_params = keeper
            .fee_params()
            .map_err(|e| ConsensusFault::CorruptState(e.to_string()))?;

        let mut events = EventManager::new();
        let mint = Minter::new(&self.store).begin_block(
            height,
            time,
            &mint_params,
            &mut self.ledger,
            &mut events,
        )?;

        let schedule =
            FeeSchedule::new(fee_params).map_err(|e| ConsensusFault::InvalidParams(e.to_string()))?;
        let exclusions = ExclusionRegistry::new(&self.store);
        let assessor = FeeAssessor::new(&schedule, &exclusions);

        let mut admitted = 0;
        let mut rejected = Vec::new();
        let mut fees_collected = CoinSet::new();

        for (index, tx) in txs.iter().enumerate() {
            let snapshot = self.ledger.clone();
            let mut tx_events = EventManager::new();
            match execute(&assessor, tx, &mut self.ledger, &snapshot, &mut tx_events) {
                Ok(system_fees) => {
                    fees_collected += &system_fees;
                    events.extend(tx_events);
                    admitted += 1;
                }
                Err(reason) => {
                    if let TxRejection::Admission(AdmissionError::Storage(err)) = &reason {
                        return Err(ConsensusFault::Storage(err.to_string()));
                    }
                    warn!(
                        target: "node",
                        height,
                        index,
                        payer = %tx.fee_payer,
                        error = %reason,
                        "transaction rejected"
                    );
                    counter!("tollgate_txs_rejected_total").increment(1);
                    self.ledger = snapshot;
                    rejected.push(RejectedTx { index, reason });
                }
            }
        }

        let base_denom = &schedule.params().base_denom;
        counter!("tollgate_txs_admitted_total").increment(admitted as u64);
        counter!("tollgate_fees_collected_total")
            .increment(saturating_u64(&fees_collected.amount_of(base_denom)));
        counter!("tollgate_minted_total").increment(saturating_u64(&mint.minted));

        info!(
            target: "node",
            height,
            %time,
            admitted,
            rejected = rejected.len(),
            minted = %mint.minted,
            fees = %fees_collected,
            "block processed"
        );

        Ok(BlockOutcome {
            height,
            time,
            mint,
            admitted,
            rejected,
            fees_collected,
            events: events.into_events(),
        })
    }
}

/// Admit `tx` against `ledger`, pricing name operations from the
/// pre-transaction `snapshot`, then run its messages.
fn execute<S: KvStore>(
    assessor: &FeeAssessor<'_, S>,
    tx: &Transaction,
    ledger: &mut MemoryLedger,
    snapshot: &MemoryLedger,
    events: &mut EventManager,
) -> Result<CoinSet, TxRejection> {
    let assessment = assessor.assess(tx, ledger, snapshot, events)?;
    for (index, msg) in tx.messages.iter().enumerate() {
        ledger
            .apply_message(msg)
            .map_err(|source| TxRejection::Execution { index, source })?;
        debug!(target: "node", index, type_url = msg.type_url(), "message executed");
    }
    Ok(assessment.system_fees)
}

fn saturating_u64(amount: &BigUint) -> u64 {
    amount.to_u64().unwrap_or(u64::MAX)
}
