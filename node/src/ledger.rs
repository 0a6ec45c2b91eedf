//! In-memory balances and name registry.
//!
//! Stands in for the account and name modules of a full chain: it is the
//! bank the fee assessor and minter talk to, the registry the assessor
//! queries, and the executor for each message once a transaction is
//! admitted. It is `Clone` so the pipeline can snapshot it per transaction.

use crate::genesis::NodeGenesis;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tollgate_fees::{NameLookupError, NameRegistry};
use tollgate_types::{
    Address, BankError, BankKeeper, CoinError, CoinSet, Input, Message, Output,
};
use tracing::debug;

/// Module account receiving name service fees.
pub const NAME_SERVICE_MODULE: &str = "name_service";
/// Module account escrowing open sell orders.
pub const MARKET_MODULE: &str = "market";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Coin(#[from] CoinError),
    #[error("name {0:?} is already registered")]
    NameTaken(String),
    #[error("name {0:?} is not registered")]
    UnknownName(String),
    #[error("{caller} does not own name {name:?}")]
    NotOwner { name: String, caller: Address },
    #[error("name {0:?} is not for sale")]
    NotForSale(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub owner: Address,
    /// Asking price when listed for sale.
    pub price: Option<CoinSet>,
    pub addresses: Vec<Address>,
}

/// Static name-service pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePricing {
    pub registration_fee: CoinSet,
    pub renewal_fee: CoinSet,
    pub address_registration_fee: CoinSet,
    pub standard_credit_grant: i64,
}

#[derive(Debug, Clone)]
pub struct MemoryLedger {
    balances: BTreeMap<Address, CoinSet>,
    supply: CoinSet,
    names: BTreeMap<String, NameRecord>,
    credits: BTreeMap<Address, i64>,
    pricing: NamePricing,
}

impl MemoryLedger {
    pub fn new(pricing: NamePricing) -> Self {
        Self {
            balances: BTreeMap::new(),
            supply: CoinSet::new(),
            names: BTreeMap::new(),
            credits: BTreeMap::new(),
            pricing,
        }
    }

    pub fn from_genesis(genesis: &NodeGenesis) -> Self {
        let mut ledger = Self::new(genesis.names.pricing());
        for account in &genesis.accounts {
            ledger.credit(account.address, &account.coins);
            ledger.supply += &account.coins;
        }
        for entry in &genesis.names.names {
            ledger.names.insert(
                entry.name.clone(),
                NameRecord {
                    owner: entry.owner,
                    price: entry.price.clone(),
                    addresses: Vec::new(),
                },
            );
            let grant = ledger.pricing.standard_credit_grant;
            ledger.credits.entry(entry.owner).or_insert(grant);
        }
        ledger
    }

    pub fn balance(&self, address: &Address) -> CoinSet {
        self.balances.get(address).cloned().unwrap_or_default()
    }

    pub fn module_balance(&self, module: &str) -> CoinSet {
        self.balance(&Address::module(module))
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &NameRecord)> {
        self.names.iter().map(|(name, record)| (name.as_str(), record))
    }

    fn credit(&mut self, address: Address, coins: &CoinSet) {
        if coins.is_empty() {
            return;
        }
        let next = &self.balance(&address) + coins;
        self.balances.insert(address, next);
    }

    fn debit(&mut self, address: &Address, coins: &CoinSet) -> Result<(), BankError> {
        if coins.is_empty() {
            return Ok(());
        }
        let remaining =
            self.balance(address)
                .checked_sub(coins)
                .map_err(|_| BankError::InsufficientFunds {
                    address: *address,
                    required: coins.clone(),
                })?;
        if remaining.is_empty() {
            self.balances.remove(address);
        } else {
            self.balances.insert(*address, remaining);
        }
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: Address, coins: &CoinSet) -> Result<(), BankError> {
        self.debit(from, coins)?;
        self.credit(to, coins);
        Ok(())
    }

    fn owned_by(&self, name: &str, caller: &Address) -> Result<&NameRecord, LedgerError> {
        let record = self
            .names
            .get(name)
            .ok_or_else(|| LedgerError::UnknownName(name.to_string()))?;
        if record.owner != *caller {
            return Err(LedgerError::NotOwner {
                name: name.to_string(),
                caller: *caller,
            });
        }
        Ok(record)
    }

    fn count_names(&self, owner: &Address) -> u64 {
        self.names.values().filter(|r| r.owner == *owner).count() as u64
    }

    fn on_name_acquired(&mut self, owner: Address) {
        if self.count_names(&owner) == 1 {
            self.credits.insert(owner, self.pricing.standard_credit_grant);
        }
    }

    fn on_name_released(&mut self, owner: Address) {
        if self.count_names(&owner) == 0 {
            self.credits.insert(owner, 0);
        }
    }

    fn name_service(&self) -> Address {
        Address::module(NAME_SERVICE_MODULE)
    }

    /// Execute one admitted message.
    pub fn apply_message(&mut self, msg: &Message) -> Result<(), LedgerError> {
        match msg {
            Message::Send { from, to, amount } => self.transfer(from, *to, amount)?,
            Message::MultiSend { inputs, outputs } => self.multi_send(inputs, outputs)?,
            Message::RegisterName { name, owner } => {
                if self.names.contains_key(name) {
                    return Err(LedgerError::NameTaken(name.clone()));
                }
                let fee = self.pricing.registration_fee.clone();
                self.transfer(owner, self.name_service(), &fee)?;
                self.names.insert(
                    name.clone(),
                    NameRecord {
                        owner: *owner,
                        price: None,
                        addresses: Vec::new(),
                    },
                );
                self.on_name_acquired(*owner);
            }
            Message::RenewName { name, owner } => {
                self.owned_by(name, owner)?;
                let fee = self.pricing.renewal_fee.clone();
                self.transfer(owner, self.name_service(), &fee)?;
            }
            Message::BuyName { name, buyer } => {
                let record = self
                    .names
                    .get(name)
                    .ok_or_else(|| LedgerError::UnknownName(name.clone()))?;
                let price = record
                    .price
                    .clone()
                    .ok_or_else(|| LedgerError::NotForSale(name.clone()))?;
                let seller = record.owner;
                self.transfer(buyer, seller, &price)?;
                self.reassign(name, *buyer);
                self.on_name_released(seller);
                self.on_name_acquired(*buyer);
            }
            Message::TransferName {
                name,
                owner,
                recipient,
            } => {
                self.owned_by(name, owner)?;
                self.reassign(name, *recipient);
                self.on_name_released(*owner);
                self.on_name_acquired(*recipient);
            }
            Message::DeleteName { name, owner } => {
                self.owned_by(name, owner)?;
                self.names.remove(name);
                self.on_name_released(*owner);
            }
            Message::RegisterAddress {
                name,
                owner,
                address,
            } => {
                self.owned_by(name, owner)?;
                let credits = self.credits.get(owner).copied().unwrap_or(0);
                if credits <= 0 {
                    let fee = self.pricing.address_registration_fee.clone();
                    self.transfer(owner, self.name_service(), &fee)?;
                }
                self.credits.insert(*owner, credits.saturating_sub(1));
                if let Some(record) = self.names.get_mut(name) {
                    record.addresses.push(*address);
                }
            }
            Message::CreateSellOrder { seller, amount } => {
                self.transfer(seller, Address::module(MARKET_MODULE), amount)?;
            }
            Message::Other { type_url } => {
                debug!(target: "node", type_url, "no handler for message type, skipping");
            }
        }
        Ok(())
    }

    fn reassign(&mut self, name: &str, owner: Address) {
        if let Some(record) = self.names.get_mut(name) {
            record.owner = owner;
            record.price = None;
            record.addresses.clear();
        }
    }

    fn multi_send(&mut self, inputs: &[Input], outputs: &[Output]) -> Result<(), BankError> {
        for input in inputs {
            self.debit(&input.address, &input.coins)?;
        }
        for output in outputs {
            self.credit(output.address, &output.coins);
        }
        Ok(())
    }
}

impl BankKeeper for MemoryLedger {
    fn has_at_least(&self, address: &Address, coins: &CoinSet) -> bool {
        self.balance(address).is_all_gte(coins)
    }

    fn send_to_module(
        &mut self,
        from: &Address,
        to_module: &str,
        coins: &CoinSet,
    ) -> Result<(), BankError> {
        self.transfer(from, Address::module(to_module), coins)
    }

    fn mint_coins(&mut self, module: &str, coins: &CoinSet) -> Result<(), BankError> {
        self.credit(Address::module(module), coins);
        self.supply += coins;
        Ok(())
    }

    fn send_module_to_module(
        &mut self,
        from_module: &str,
        to_module: &str,
        coins: &CoinSet,
    ) -> Result<(), BankError> {
        self.transfer(
            &Address::module(from_module),
            Address::module(to_module),
            coins,
        )
    }

    fn total_supply(&self) -> CoinSet {
        self.supply.clone()
    }
}

impl NameRegistry for MemoryLedger {
    fn owned_name_count(&self, owner: &Address) -> u64 {
        self.count_names(owner)
    }

    fn credits(&self, owner: &Address) -> i64 {
        self.credits.get(owner).copied().unwrap_or(0)
    }

    fn standard_credit_grant(&self) -> i64 {
        self.pricing.standard_credit_grant
    }

    fn price_of(&self, name: &str) -> Result<CoinSet, NameLookupError> {
        let record = self
            .names
            .get(name)
            .ok_or_else(|| NameLookupError::Unknown(name.to_string()))?;
        record
            .price
            .clone()
            .ok_or_else(|| NameLookupError::NotForSale(name.to_string()))
    }

    fn name_registration_fee(&self) -> CoinSet {
        self.pricing.registration_fee.clone()
    }

    fn name_renewal_fee(&self) -> CoinSet {
        self.pricing.renewal_fee.clone()
    }

    fn address_registration_fee(&self) -> CoinSet {
        self.pricing.address_registration_fee.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(s: &str) -> CoinSet {
        s.parse().unwrap()
    }

    fn addr(b: u8) -> Address {
        Address([b; 32])
    }

    fn ledger() -> MemoryLedger {
        let mut ledger = MemoryLedger::new(NamePricing {
            registration_fee: coins("1000utoll"),
            renewal_fee: coins("500utoll"),
            address_registration_fee: coins("50utoll"),
            standard_credit_grant: 1,
        });
        for holder in [addr(1), addr(2)] {
            ledger.credit(holder, &coins("10000utoll"));
            ledger.supply += &coins("10000utoll");
        }
        ledger
    }

    #[test]
    fn send_moves_value() {
        let mut l = ledger();
        l.apply_message(&Message::Send {
            from: addr(1),
            to: addr(3),
            amount: coins("250utoll"),
        })
        .unwrap();
        assert_eq!(l.balance(&addr(1)), coins("9750utoll"));
        assert_eq!(l.balance(&addr(3)), coins("250utoll"));
    }

    #[test]
    fn overdraft_rejected() {
        let mut l = ledger();
        let err = l
            .apply_message(&Message::Send {
                from: addr(3),
                to: addr(1),
                amount: coins("1utoll"),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Bank(BankError::InsufficientFunds { .. })));
    }

    #[test]
    fn first_name_grants_credit_and_address_uses_it() {
        let mut l = ledger();
        l.apply_message(&Message::RegisterName {
            name: "alice".into(),
            owner: addr(1),
        })
        .unwrap();
        assert_eq!(l.owned_name_count(&addr(1)), 1);
        assert_eq!(NameRegistry::credits(&l, &addr(1)), 1);

        for _ in 0..2 {
            l.apply_message(&Message::RegisterAddress {
                name: "alice".into(),
                owner: addr(1),
                address: addr(9),
            })
            .unwrap();
        }
        // registration 1000, first address free, second 50
        assert_eq!(l.balance(&addr(1)), coins("8950utoll"));
        assert_eq!(l.module_balance(NAME_SERVICE_MODULE), coins("1050utoll"));
    }

    #[test]
    fn buying_listed_name_pays_seller() {
        let mut l = ledger();
        l.apply_message(&Message::RegisterName {
            name: "bob".into(),
            owner: addr(2),
        })
        .unwrap();
        l.names.get_mut("bob").unwrap().price = Some(coins("700utoll"));
        assert_eq!(l.price_of("bob").unwrap(), coins("700utoll"));

        l.apply_message(&Message::BuyName {
            name: "bob".into(),
            buyer: addr(1),
        })
        .unwrap();
        let (_, record) = l.names().find(|(name, _)| *name == "bob").unwrap();
        assert_eq!(record.owner, addr(1));
        assert_eq!(l.balance(&addr(2)), coins("9700utoll"));
        assert_eq!(NameRegistry::credits(&l, &addr(2)), 0);
        assert!(matches!(l.price_of("bob"), Err(NameLookupError::NotForSale(_))));
    }

    #[test]
    fn only_owner_may_transfer() {
        let mut l = ledger();
        l.apply_message(&Message::RegisterName {
            name: "carol".into(),
            owner: addr(1),
        })
        .unwrap();
        let err = l
            .apply_message(&Message::TransferName {
                name: "carol".into(),
                owner: addr(2),
                recipient: addr(3),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotOwner { .. }));
    }

    #[test]
    fn minting_grows_supply() {
        let mut l = ledger();
        let before = l.total_supply();
        l.mint_coins("mint", &coins("5utoll")).unwrap();
        assert_eq!(l.total_supply(), &before + &coins("5utoll"));
    }
}
