use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crowdsale_core::error::SaleError;
use crowdsale_core::event::LedgerEvent;
use crowdsale_core::types::{Balance, CurrencyChannel, Identity, Timestamp, TxId};
use crowdsale_vesting::{VestingSchedule, VestingSource};

use crate::store::{LedgerStore, MemoryStore, SledStore, WriteBatch};

/// Logical key layout. Every entity lives under its own prefix:
///
///   meta/admin               → Identity
///   meta/init_time           → Timestamp
///   meta/total_supply        → Balance
///   meta/last_tx/<channel>   → TxId
///   meta/unsold_claimed      → bool
///   meta/xfer_wl_enabled     → bool
///   pool/allocated           → Balance
///   pool/locked_at           → Timestamp
///   bal/<id>                 → Balance
///   contrib/<id>             → Balance (tokens bought during the sale)
///   kyc/<id>                 → u8 group
///   vest/<id>                → VestingSchedule
///   xfer_wl/<id>             → ()
pub mod keys {
    use crowdsale_core::types::{CurrencyChannel, Identity};

    pub const ADMIN: &[u8] = b"meta/admin";
    pub const INIT_TIME: &[u8] = b"meta/init_time";
    pub const TOTAL_SUPPLY: &[u8] = b"meta/total_supply";
    pub const UNSOLD_CLAIMED: &[u8] = b"meta/unsold_claimed";
    pub const XFER_WL_ENABLED: &[u8] = b"meta/xfer_wl_enabled";
    pub const POOL_ALLOCATED: &[u8] = b"pool/allocated";
    pub const POOL_LOCKED_AT: &[u8] = b"pool/locked_at";

    pub const BALANCE: &[u8] = b"bal/";
    pub const CONTRIBUTION: &[u8] = b"contrib/";
    pub const KYC: &[u8] = b"kyc/";
    pub const VESTING: &[u8] = b"vest/";
    pub const XFER_WL: &[u8] = b"xfer_wl/";

    pub fn last_tx(channel: CurrencyChannel) -> Vec<u8> {
        format!("meta/last_tx/{}", channel.as_str()).into_bytes()
    }

    pub fn scoped(prefix: &[u8], id: &Identity) -> Vec<u8> {
        let mut key = Vec::with_capacity(prefix.len() + id.0.len());
        key.extend_from_slice(prefix);
        key.extend_from_slice(id.as_bytes());
        key
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SaleError> {
    bincode::serialize(value).map_err(|e| SaleError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SaleError> {
    bincode::deserialize(bytes).map_err(|e| SaleError::Serialization(e.to_string()))
}

/// Typed view of the ledger's persistent state.
///
/// Reads go straight to the store. Writes are staged in `StagedMutations`
/// and applied by `commit` in one atomic batch.
pub struct StateDb {
    store: Arc<dyn LedgerStore>,
}

impl StateDb {
    /// Open or create a sled-backed database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SaleError> {
        Ok(Self::with_store(Arc::new(SledStore::open(path)?)))
    }

    /// Fresh database that lives only in memory.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, SaleError> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Contract state ────────────────────────────────────────────────────────

    pub fn admin(&self) -> Result<Option<Identity>, SaleError> {
        self.get_value(keys::ADMIN)
    }

    pub fn init_time(&self) -> Result<Option<Timestamp>, SaleError> {
        self.get_value(keys::INIT_TIME)
    }

    pub fn is_initialised(&self) -> Result<bool, SaleError> {
        Ok(self.init_time()?.is_some())
    }

    pub fn total_supply(&self) -> Result<Balance, SaleError> {
        Ok(self.get_value(keys::TOTAL_SUPPLY)?.unwrap_or(0))
    }

    pub fn last_processed(&self, channel: CurrencyChannel) -> Result<Option<TxId>, SaleError> {
        self.get_value(&keys::last_tx(channel))
    }

    pub fn unsold_claimed(&self) -> Result<bool, SaleError> {
        Ok(self.get_value(keys::UNSOLD_CLAIMED)?.unwrap_or(false))
    }

    pub fn transfer_from_whitelisting_enabled(&self) -> Result<bool, SaleError> {
        Ok(self.get_value(keys::XFER_WL_ENABLED)?.unwrap_or(false))
    }

    // ── Private sale pool ─────────────────────────────────────────────────────

    pub fn pool_allocated(&self) -> Result<Balance, SaleError> {
        Ok(self.get_value(keys::POOL_ALLOCATED)?.unwrap_or(0))
    }

    /// When the pool was locked, or `None` while allocations are still open.
    pub fn pool_locked_at(&self) -> Result<Option<Timestamp>, SaleError> {
        self.get_value(keys::POOL_LOCKED_AT)
    }

    // ── Per-identity state ────────────────────────────────────────────────────

    pub fn balance_of(&self, id: &Identity) -> Result<Balance, SaleError> {
        Ok(self.get_value(&keys::scoped(keys::BALANCE, id))?.unwrap_or(0))
    }

    pub fn contribution_of(&self, id: &Identity) -> Result<Balance, SaleError> {
        Ok(self.get_value(&keys::scoped(keys::CONTRIBUTION, id))?.unwrap_or(0))
    }

    /// Whitelist group of `id`; 0 when not whitelisted.
    pub fn group_of(&self, id: &Identity) -> Result<u8, SaleError> {
        Ok(self.get_value(&keys::scoped(keys::KYC, id))?.unwrap_or(0))
    }

    pub fn is_transfer_from_whitelisted(&self, id: &Identity) -> Result<bool, SaleError> {
        Ok(self.store.get(&keys::scoped(keys::XFER_WL, id))?.is_some())
    }

    /// Every non-empty balance, ordered by identity.
    pub fn balances(&self) -> Result<Vec<(Identity, Balance)>, SaleError> {
        self.store
            .scan_prefix(keys::BALANCE)?
            .into_iter()
            .map(|(k, v)| -> Result<(Identity, Balance), SaleError> {
                Ok((Identity::from_slice(&k[keys::BALANCE.len()..])?, decode(&v)?))
            })
            .collect()
    }

    // ── Commit ────────────────────────────────────────────────────────────────

    /// Apply all staged writes atomically and hand back the staged events,
    /// which must only be delivered once this returns `Ok`.
    pub fn commit(&self, staged: StagedMutations) -> Result<Vec<LedgerEvent>, SaleError> {
        let StagedMutations { batch, events } = staged;
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        Ok(events)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), SaleError> {
        self.store.flush()
    }
}

impl VestingSource for StateDb {
    fn vesting_schedule(&self, id: &Identity) -> Result<Option<VestingSchedule>, SaleError> {
        self.get_value(&keys::scoped(keys::VESTING, id))
    }
}

// ── Staged mutations ──────────────────────────────────────────────────────────

/// All state changes and events of one operation, staged before atomic commit.
#[derive(Default)]
pub struct StagedMutations {
    batch: WriteBatch,
    events: Vec<LedgerEvent>,
}

impl StagedMutations {
    fn put<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), SaleError> {
        self.batch.put(key, encode(value)?);
        Ok(())
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn put_admin(&mut self, id: &Identity) -> Result<(), SaleError> {
        self.put(keys::ADMIN.to_vec(), id)
    }

    pub fn put_init_time(&mut self, t: Timestamp) -> Result<(), SaleError> {
        self.put(keys::INIT_TIME.to_vec(), &t)
    }

    pub fn put_total_supply(&mut self, supply: Balance) -> Result<(), SaleError> {
        self.put(keys::TOTAL_SUPPLY.to_vec(), &supply)
    }

    pub fn put_last_processed(&mut self, channel: CurrencyChannel, tx_id: &TxId) -> Result<(), SaleError> {
        self.put(keys::last_tx(channel), tx_id)
    }

    pub fn put_unsold_claimed(&mut self) -> Result<(), SaleError> {
        self.put(keys::UNSOLD_CLAIMED.to_vec(), &true)
    }

    pub fn put_transfer_from_whitelisting(&mut self, enabled: bool) -> Result<(), SaleError> {
        self.put(keys::XFER_WL_ENABLED.to_vec(), &enabled)
    }

    pub fn put_pool_allocated(&mut self, allocated: Balance) -> Result<(), SaleError> {
        self.put(keys::POOL_ALLOCATED.to_vec(), &allocated)
    }

    pub fn put_pool_locked_at(&mut self, t: Timestamp) -> Result<(), SaleError> {
        self.put(keys::POOL_LOCKED_AT.to_vec(), &t)
    }

    pub fn put_balance(&mut self, id: &Identity, balance: Balance) -> Result<(), SaleError> {
        self.put(keys::scoped(keys::BALANCE, id), &balance)
    }

    pub fn put_contribution(&mut self, id: &Identity, total: Balance) -> Result<(), SaleError> {
        self.put(keys::scoped(keys::CONTRIBUTION, id), &total)
    }

    pub fn put_group(&mut self, id: &Identity, group: u8) -> Result<(), SaleError> {
        self.put(keys::scoped(keys::KYC, id), &group)
    }

    pub fn delete_group(&mut self, id: &Identity) {
        self.batch.delete(keys::scoped(keys::KYC, id));
    }

    pub fn put_schedule(&mut self, id: &Identity, schedule: &VestingSchedule) -> Result<(), SaleError> {
        self.put(keys::scoped(keys::VESTING, id), schedule)
    }

    pub fn put_transfer_from_listing(&mut self, id: &Identity) -> Result<(), SaleError> {
        self.put(keys::scoped(keys::XFER_WL, id), &())
    }

    pub fn delete_transfer_from_listing(&mut self, id: &Identity) {
        self.batch.delete(keys::scoped(keys::XFER_WL, id));
    }
}
