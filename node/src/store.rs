use crate::config::{NodeConfig, StorageKind};
use anyhow::{Context, Result};
use tollgate_storage::{KvPairs, KvStore, MemoryStore, SledStore, StorageResult};

/// Backend selected by configuration.
pub enum NodeStore {
    Memory(MemoryStore),
    Sled(SledStore),
}

impl NodeStore {
    pub fn open(config: &NodeConfig) -> Result<Self> {
        match config.storage {
            StorageKind::Memory => Ok(NodeStore::Memory(MemoryStore::new())),
            StorageKind::Sled => {
                let path = config.state_dir();
                let store = SledStore::open(&path)
                    .with_context(|| format!("opening sled store at {}", path.display()))?;
                Ok(NodeStore::Sled(store))
            }
        }
    }

    pub fn flush(&self) -> Result<()> {
        match self {
            NodeStore::Memory(_) => Ok(()),
            NodeStore::Sled(store) => store.flush(),
        }
    }

    fn inner(&self) -> &dyn KvStore {
        match self {
            NodeStore::Memory(store) => store,
            NodeStore::Sled(store) => store,
        }
    }
}

impl KvStore for NodeStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.inner().get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.inner().set(key, value)
    }

    fn delete(&self, key: &[u8]) -> StorageResult<()> {
        self.inner().delete(key)
    }

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        self.inner().has(key)
    }

    fn prefix_iter(&self, prefix: &[u8]) -> StorageResult<KvPairs> {
        self.inner().prefix_iter(prefix)
    }
}
