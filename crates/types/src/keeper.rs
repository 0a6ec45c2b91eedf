//! Interface to the account balance / supply authority.
//!
//! Balances live outside the economics core; fee assessment and minting
//! only ever talk to them through [`BankKeeper`].

use crate::{Address, CoinSet};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BankError {
    #[error("account {address} holds insufficient funds for {required}")]
    InsufficientFunds { address: Address, required: CoinSet },
    #[error("unknown module account: {0}")]
    UnknownModule(String),
    #[error("bank rejected operation: {0}")]
    Rejected(String),
}

pub trait BankKeeper {
    /// Whether `address` can spend at least `coins` right now.
    fn has_at_least(&self, address: &Address, coins: &CoinSet) -> bool;

    fn send_to_module(
        &mut self,
        from: &Address,
        to_module: &str,
        coins: &CoinSet,
    ) -> Result<(), BankError>;

    /// Create new supply, credited to `module`.
    fn mint_coins(&mut self, module: &str, coins: &CoinSet) -> Result<(), BankError>;

    fn send_module_to_module(
        &mut self,
        from_module: &str,
        to_module: &str,
        coins: &CoinSet,
    ) -> Result<(), BankError>;

    fn total_supply(&self) -> CoinSet;
}
