use serde::{Deserialize, Serialize};
use tollgate_storage::{keys, KvStore, KvStoreExt, StorageError};
use tollgate_types::{BlockTime, Dec};

/// Minting cursor carried from block to block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterState {
    /// Block time of the last processed block.
    pub previous_mint_time: BlockTime,
    /// Sub-unit remainder of the last accrual, always below one.
    pub leftover: Dec,
}

impl MinterState {
    pub fn validate(&self) -> Result<(), String> {
        if !self.leftover.is_below_one() {
            return Err(format!("leftover {} is not below one", self.leftover));
        }
        Ok(())
    }

    pub fn load<S: KvStore + ?Sized>(store: &S) -> Result<Option<Self>, StorageError> {
        store.get_json(keys::MINTER_STATE_KEY)
    }

    pub fn save<S: KvStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        store.set_json(keys::MINTER_STATE_KEY, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_storage::MemoryStore;

    #[test]
    fn default_is_genesis_state() {
        let state = MinterState::default();
        assert_eq!(state.previous_mint_time, BlockTime::GENESIS);
        assert!(state.leftover.is_zero());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn leftover_of_one_is_invalid() {
        let state = MinterState {
            leftover: Dec::one(),
            ..MinterState::default()
        };
        assert!(state.validate().is_err());
    }

    #[test]
    fn persists_under_single_key() {
        let store = MemoryStore::new();
        assert_eq!(MinterState::load(&store).unwrap(), None);
        let state = MinterState {
            previous_mint_time: BlockTime::from_secs(42),
            leftover: "0.25".parse().unwrap(),
        };
        state.save(&store).unwrap();
        assert_eq!(MinterState::load(&store).unwrap(), Some(state));
        assert_eq!(store.len(), 1);
    }
}
