//! Governance-managed set of message types exempt from the system fee.

use tollgate_storage::{keys, KvStore, StorageError};
use tracing::debug;

const PRESENT: &[u8] = &[0x01];

/// Presence-flag view over the `0x01` key range of a [`KvStore`].
pub struct ExclusionRegistry<S> {
    store: S,
}

impl<S: KvStore> ExclusionRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn is_excluded(&self, message_type: &str) -> Result<bool, StorageError> {
        self.store.has(&keys::excluded_message_key(message_type))
    }

    pub fn add(&self, message_type: &str) -> Result<(), StorageError> {
        debug!(target: "fees", message_type, "excluding message type from system fee");
        self.store
            .set(&keys::excluded_message_key(message_type), PRESENT)
    }

    /// Removing a type that was never excluded is a no-op.
    pub fn remove(&self, message_type: &str) -> Result<(), StorageError> {
        debug!(target: "fees", message_type, "re-including message type in system fee");
        self.store.delete(&keys::excluded_message_key(message_type))
    }

    /// Every excluded type in ascending key order.
    pub fn list_all(&self) -> Result<Vec<String>, StorageError> {
        let prefix_len = keys::EXCLUDED_MESSAGE_PREFIX.len();
        self.store
            .prefix_iter(keys::EXCLUDED_MESSAGE_PREFIX)?
            .into_iter()
            .map(|(key, _)| {
                String::from_utf8(key[prefix_len..].to_vec()).map_err(|e| StorageError::Corrupt {
                    key: hex::encode(&key),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_storage::MemoryStore;

    #[test]
    fn add_remove_and_query() {
        let registry = ExclusionRegistry::new(MemoryStore::new());
        assert!(!registry.is_excluded("bank/Send").unwrap());

        registry.add("bank/Send").unwrap();
        assert!(registry.is_excluded("bank/Send").unwrap());
        assert!(!registry.is_excluded("bank/MultiSend").unwrap());

        registry.remove("bank/Send").unwrap();
        assert!(!registry.is_excluded("bank/Send").unwrap());
    }

    #[test]
    fn list_is_key_ordered_not_insertion_ordered() {
        let registry = ExclusionRegistry::new(MemoryStore::new());
        registry.add("names/RegisterName").unwrap();
        registry.add("bank/Send").unwrap();
        registry.add("market/CreateSellOrder").unwrap();
        assert_eq!(
            registry.list_all().unwrap(),
            vec!["bank/Send", "market/CreateSellOrder", "names/RegisterName"]
        );
    }

    #[test]
    fn adding_twice_keeps_single_entry() {
        let store = MemoryStore::new();
        let registry = ExclusionRegistry::new(&store);
        registry.add("bank/Send").unwrap();
        registry.add("bank/Send").unwrap();
        assert_eq!(registry.list_all().unwrap().len(), 1);
    }

    #[test]
    fn other_key_ranges_are_ignored() {
        let store = MemoryStore::new();
        store.set(&[0x10], b"{}").unwrap();
        store.set(&[0x20, b'f'], b"{}").unwrap();
        let registry = ExclusionRegistry::new(&store);
        assert!(registry.list_all().unwrap().is_empty());
    }
}
