//! Byte-keyed state store.
//!
//! The economics modules never see a concrete database: they hold a
//! `&dyn`/generic [`KvStore`] and address it with short binary prefixes.
//! Iteration is always in ascending key order so every replica walks the
//! same sequence.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Ordered key/value pairs returned by prefix scans.
pub type KvPairs = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract key-value store
pub trait KvStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;
    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;
    fn delete(&self, key: &[u8]) -> StorageResult<()>;

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, ascending by key.
    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        (**self).has(key)
    }

    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs> {
        (**self).prefix_iter(prefix)
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        (**self).delete(key)
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        (**self).has(key)
    }

    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs> {
        (**self).prefix_iter(prefix)
    }
}

/// JSON-typed accessors layered over any [`KvStore`].
pub trait KvStoreExt: KvStore {
    fn get_json<T: DeserializeOwned>(&self, key: &[u8]) -> StorageResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    key: hex::encode(key),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &[u8], value: &T) -> StorageResult<()> {
        let data = serde_json::to_vec(value)?;
        self.set(key, &data)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// Key layout shared by every module writing into the state store.
pub mod keys {
    /// `0x01 ++ message_type` marks an excluded message type.
    pub const EXCLUDED_MESSAGE_PREFIX: &[u8] = &[0x01];
    /// Single JSON-encoded minter state record.
    pub const MINTER_STATE_KEY: &[u8] = &[0x10];
    /// `0x20 ++ subspace` holds a module's JSON parameter struct.
    pub const PARAMS_PREFIX: &[u8] = &[0x20];

    pub fn excluded_message_key(message_type: &str) -> Vec<u8> {
        super::prefixed_key(EXCLUDED_MESSAGE_PREFIX, message_type.as_bytes())
    }

    pub fn params_key(subspace: &str) -> Vec<u8> {
        super::prefixed_key(PARAMS_PREFIX, subspace.as_bytes())
    }
}

/// Build `prefix ++ suffix`.
pub fn prefixed_key(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

/// Sled-backed implementation
pub struct SledStore {
    db: Db,
    state: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let db = sled::open(path)?;
        let state = db.open_tree("state")?;
        tracing::debug!(target: "storage", entries = state.len(), "opened sled state tree");
        Ok(Self { db, state })
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

impl KvStore for SledStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.state.get(key)?.map(|v| v.to_vec()))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.state.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.state.remove(key)?;
        Ok(())
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.state.contains_key(key)?)
    }

    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs> {
        self.state
            .scan_prefix(prefix)
            .map(|item| {
                let (k, v) = item?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }
}

/// In-memory implementation
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs> {
        Ok(self
            .entries
            .read()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_prefix_iter_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store.set(b"\x01b", b"1").unwrap();
        store.set(b"\x01a", b"1").unwrap();
        store.set(b"\x02a", b"1").unwrap();
        store.set(b"\x00z", b"1").unwrap();

        let keys: Vec<_> = store
            .prefix_iter(b"\x01")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"\x01a".to_vec(), b"\x01b".to_vec()]);
    }

    #[test]
    fn memory_delete_absent_key_is_ok() {
        let store = MemoryStore::new();
        store.delete(b"missing").unwrap();
        assert!(!store.has(b"missing").unwrap());
    }

    #[test]
    fn json_helpers_report_corruption() {
        let store = MemoryStore::new();
        store.set(b"k", b"not json").unwrap();
        let err = store.get_json::<u64>(b"k").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));

        store.set_json(b"k", &42u64).unwrap();
        assert_eq!(store.get_json::<u64>(b"k").unwrap(), Some(42));
    }

    #[test]
    fn prefixed_key_concatenates() {
        assert_eq!(prefixed_key(&[0x20], b"fee"), vec![0x20, b'f', b'e', b'e']);
        assert_eq!(keys::params_key("fee"), prefixed_key(&[0x20], b"fee"));
        assert_eq!(keys::excluded_message_key("bank/Send")[0], 0x01);
    }
}
