use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crowdsale_core::error::SaleError;

/// A set of writes applied atomically by `LedgerStore::commit`.
/// `None` deletes the key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl WriteBatch {
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push((key, Some(value)));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push((key, None));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<(Vec<u8>, Option<Vec<u8>>)> {
        self.ops
    }
}

/// Key-value storage owned exclusively by the ledger. Keys are namespaced by
/// prefix (see `db::keys`); implementations only need ordered byte keys.
pub trait LedgerStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SaleError>;

    /// Every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, SaleError>;

    /// Apply every write in `batch` or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<(), SaleError>;

    fn flush(&self) -> Result<(), SaleError>;
}

// ── SledStore ─────────────────────────────────────────────────────────────────

/// Persistent store backed by sled (pure-Rust, no C dependencies).
/// All namespaces share one tree so a batch commit is atomic.
pub struct SledStore {
    db: sled::Db,
    ledger: sled::Tree,
}

impl SledStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SaleError> {
        let db = sled::open(path).map_err(|e| SaleError::Storage(e.to_string()))?;
        let ledger = db.open_tree("ledger").map_err(|e| SaleError::Storage(e.to_string()))?;
        Ok(Self { db, ledger })
    }
}

impl LedgerStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SaleError> {
        self.ledger
            .get(key)
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| SaleError::Storage(e.to_string()))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, SaleError> {
        let mut out = Vec::new();
        for item in self.ledger.scan_prefix(prefix) {
            let (k, v) = item.map_err(|e| SaleError::Storage(e.to_string()))?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), SaleError> {
        let mut sled_batch = sled::Batch::default();
        for (key, value) in batch.into_ops() {
            match value {
                Some(v) => sled_batch.insert(key, v),
                None => sled_batch.remove(key),
            }
        }
        self.ledger
            .apply_batch(sled_batch)
            .map_err(|e| SaleError::Storage(e.to_string()))
    }

    fn flush(&self) -> Result<(), SaleError> {
        self.db.flush().map_err(|e| SaleError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, SaleError> {
        self.entries
            .lock()
            .map_err(|_| SaleError::Storage("memory store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SaleError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, SaleError> {
        Ok(self
            .lock()?
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), SaleError> {
        let mut entries = self.lock()?;
        for (key, value) in batch.into_ops() {
            match value {
                Some(v) => {
                    entries.insert(key, v);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), SaleError> {
        Ok(())
    }
}
