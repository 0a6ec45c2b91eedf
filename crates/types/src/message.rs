//! Transaction messages.
//!
//! `Message` is a closed set of variants, one per operation the fee
//! assessor knows how to price. Anything else arrives as
//! [`Message::Other`] and carries no fee.

use crate::{Address, CoinSet};
use serde::{Deserialize, Serialize};

/// Longest memo a transaction may carry, in bytes.
pub const MAX_MEMO_BYTES: usize = 256;
/// Longest name accepted by the name messages, in bytes.
pub const MAX_NAME_BYTES: usize = 64;

pub const TYPE_REGISTER_NAME: &str = "names/RegisterName";
pub const TYPE_RENEW_NAME: &str = "names/RenewName";
pub const TYPE_BUY_NAME: &str = "names/BuyName";
pub const TYPE_TRANSFER_NAME: &str = "names/TransferName";
pub const TYPE_DELETE_NAME: &str = "names/DeleteName";
pub const TYPE_REGISTER_ADDRESS: &str = "names/RegisterAddress";
pub const TYPE_SEND: &str = "bank/Send";
pub const TYPE_MULTI_SEND: &str = "bank/MultiSend";
pub const TYPE_CREATE_SELL_ORDER: &str = "market/CreateSellOrder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub address: Address,
    pub coins: CoinSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub coins: CoinSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    RegisterName { name: String, owner: Address },
    RenewName { name: String, owner: Address },
    BuyName { name: String, buyer: Address },
    TransferName { name: String, owner: Address, recipient: Address },
    DeleteName { name: String, owner: Address },
    RegisterAddress { name: String, owner: Address, address: Address },
    Send { from: Address, to: Address, amount: CoinSet },
    MultiSend { inputs: Vec<Input>, outputs: Vec<Output> },
    CreateSellOrder { seller: Address, amount: CoinSet },
    /// A message kind this module does not price.
    Other { type_url: String },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction carries no messages")]
    Empty,
    #[error("transaction has no fee payer")]
    MissingFeePayer,
    #[error("memo is {0} bytes, limit is {MAX_MEMO_BYTES}")]
    MemoTooLong(usize),
    #[error("message {index} ({type_url}) is malformed: {reason}")]
    InvalidMessage {
        index: usize,
        type_url: String,
        reason: String,
    },
}

impl Message {
    /// Routing identifier of the form `<route>/<type>`, as stored in the
    /// exclusion set.
    pub fn type_url(&self) -> &str {
        match self {
            Message::RegisterName { .. } => TYPE_REGISTER_NAME,
            Message::RenewName { .. } => TYPE_RENEW_NAME,
            Message::BuyName { .. } => TYPE_BUY_NAME,
            Message::TransferName { .. } => TYPE_TRANSFER_NAME,
            Message::DeleteName { .. } => TYPE_DELETE_NAME,
            Message::RegisterAddress { .. } => TYPE_REGISTER_ADDRESS,
            Message::Send { .. } => TYPE_SEND,
            Message::MultiSend { .. } => TYPE_MULTI_SEND,
            Message::CreateSellOrder { .. } => TYPE_CREATE_SELL_ORDER,
            Message::Other { type_url } => type_url,
        }
    }

    /// Stateless shape checks.
    pub fn validate_basic(&self) -> Result<(), String> {
        match self {
            Message::RegisterName { name, .. }
            | Message::RenewName { name, .. }
            | Message::BuyName { name, .. }
            | Message::DeleteName { name, .. }
            | Message::RegisterAddress { name, .. } => validate_name(name),
            Message::TransferName {
                name,
                owner,
                recipient,
            } => {
                validate_name(name)?;
                if owner == recipient {
                    return Err("recipient already owns the name".into());
                }
                Ok(())
            }
            Message::Send { amount, .. } | Message::CreateSellOrder { amount, .. } => {
                if amount.is_empty() {
                    return Err("amount must be positive".into());
                }
                Ok(())
            }
            Message::MultiSend { inputs, outputs } => {
                if inputs.is_empty() || outputs.is_empty() {
                    return Err("inputs and outputs must both be non-empty".into());
                }
                let total_in = inputs
                    .iter()
                    .fold(CoinSet::new(), |acc, i| &acc + &i.coins);
                let total_out = outputs
                    .iter()
                    .fold(CoinSet::new(), |acc, o| &acc + &o.coins);
                if total_in != total_out {
                    return Err(format!("inputs {total_in} do not match outputs {total_out}"));
                }
                Ok(())
            }
            Message::Other { type_url } => {
                if type_url.is_empty() {
                    return Err("type url must not be empty".into());
                }
                Ok(())
            }
        }
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > MAX_NAME_BYTES {
        return Err(format!("name must be 1..={MAX_NAME_BYTES} bytes"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(format!("name {name:?} contains invalid characters"));
    }
    Ok(())
}

/// A standard transaction: ordered messages paid for by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub messages: Vec<Message>,
    pub fee_payer: Address,
    #[serde(default)]
    pub memo: String,
}

impl Transaction {
    pub fn new(fee_payer: Address, messages: Vec<Message>) -> Self {
        Self {
            messages,
            fee_payer,
            memo: String::new(),
        }
    }

    pub fn validate_basic(&self) -> Result<(), TxError> {
        if self.messages.is_empty() {
            return Err(TxError::Empty);
        }
        if self.fee_payer.is_zero() {
            return Err(TxError::MissingFeePayer);
        }
        if self.memo.len() > MAX_MEMO_BYTES {
            return Err(TxError::MemoTooLong(self.memo.len()));
        }
        for (index, msg) in self.messages.iter().enumerate() {
            msg.validate_basic()
                .map_err(|reason| TxError::InvalidMessage {
                    index,
                    type_url: msg.type_url().to_string(),
                    reason,
                })?;
        }
        Ok(())
    }
}
