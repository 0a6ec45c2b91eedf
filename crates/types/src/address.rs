use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw address length in bytes.
pub const ADDRESS_LEN: usize = 32;

const PREFIX: char = 't';
const HEX_LEN: usize = ADDRESS_LEN * 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressError {
    #[error("address {0:?} does not start with 't'")]
    MissingPrefix(String),
    #[error("address has {0} hex digits, want 64")]
    WrongLength(usize),
    #[error("address payload is not hex: {0}")]
    NotHex(#[from] hex::FromHexError),
}

/// Well-known module account names.
pub mod module_accounts {
    /// Receives the system fee surcharge at admission.
    pub const FEE_COLLECTOR: &str = "fee_collector";
    /// Holds freshly minted supply until it is distributed.
    pub const MINTER: &str = "mint";
    /// Gets the rounded-down half of each mint.
    pub const TREASURY_POOL: &str = "treasury_pool";
    /// Gets the rest.
    pub const REWARDS_POOL: &str = "rewards_pool";
}

/// Account address. Text form is `t` followed by 64 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// `blake3("MODULE_ACCOUNT" || name)`. Nobody holds a key for these;
    /// balances move only through protocol transitions.
    pub fn module(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"MODULE_ACCOUNT");
        hasher.update(name.as_bytes());
        Address(*hasher.finalize().as_bytes())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;
        if digits.len() != HEX_LEN {
            return Err(AddressError::WrongLength(digits.len()));
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(value: [u8; ADDRESS_LEN]) -> Self {
        Address(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}
