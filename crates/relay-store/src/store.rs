use std::path::Path;

use chrono::Utc;
use relay_core::error::RelayError;
use relay_core::types::{ChainId, PoolMember, SwapId, SwapStatus, Timestamp};

use crate::intent::Intent;
use crate::lock::{Lease, LockTable};

/// Durable, crash-safe KV store of Swaps keyed by `id` (C4).
///
/// Named trees:
///   swaps            — SwapId bytes      -> bincode(Swap)
///   intents          — SwapId || step     -> bincode(Intent)
///   monitor_cursors  — chainId utf8       -> bincode(MonitorCursor)
///   pool_telemetry   — chainId || url     -> bincode(PoolTelemetrySnapshot)
///   locks            — SwapId bytes       -> bincode(LockRecord)
pub struct SwapStore {
    _db: sled::Db,
    swaps: sled::Tree,
    intents: sled::Tree,
    monitor_cursors: sled::Tree,
    pool_telemetry: sled::Tree,
    locks: LockTable,
}

fn ser<T: serde::Serialize>(v: &T) -> Result<Vec<u8>, RelayError> {
    bincode::serialize(v).map_err(|e| RelayError::Serialization(e.to_string()))
}

fn de<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, RelayError> {
    bincode::deserialize(bytes).map_err(|e| RelayError::Serialization(e.to_string()))
}

impl SwapStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RelayError> {
        let db = sled::open(path).map_err(|e| RelayError::Storage(e.to_string()))?;
        let swaps = db
            .open_tree("swaps")
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        let intents = db
            .open_tree("intents")
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        let monitor_cursors = db
            .open_tree("monitor_cursors")
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        let pool_telemetry = db
            .open_tree("pool_telemetry")
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        let locks = db
            .open_tree("locks")
            .map_err(|e| RelayError::Storage(e.to_string()))?;

        Ok(Self {
            _db: db,
            swaps,
            intents,
            monitor_cursors,
            pool_telemetry,
            locks: LockTable::new(locks),
        })
    }

    // ── Swaps ─────────────────────────────────────────────────────────────────

    /// `create(swap)` — fails with `Conflict` if `id` exists.
    pub fn create(&self, swap: &relay_core::types::Swap) -> Result<(), RelayError> {
        let key = swap.id.0;
        if self
            .swaps
            .contains_key(key)
            .map_err(|e| RelayError::Storage(e.to_string()))?
        {
            return Err(RelayError::Conflict);
        }
        self.swaps
            .insert(key, ser(swap)?)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get(&self, id: &SwapId) -> Result<Option<relay_core::types::Swap>, RelayError> {
        match self
            .swaps
            .get(id.0)
            .map_err(|e| RelayError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    /// `list(filter, pagination)` — filter by status, paginate by swap id.
    pub fn list(
        &self,
        filter: SwapFilter,
        pagination: Pagination,
    ) -> Result<Vec<relay_core::types::Swap>, RelayError> {
        let mut out = Vec::new();
        let skip_until = pagination.after.as_ref().map(|id| id.0);
        let mut skipping = skip_until.is_some();

        for item in self.swaps.iter() {
            let (key, bytes) = item.map_err(|e| RelayError::Storage(e.to_string()))?;
            if skipping {
                if key.as_ref() == skip_until.unwrap() {
                    skipping = false;
                }
                continue;
            }
            let swap: relay_core::types::Swap = de(&bytes)?;
            if let Some(statuses) = &filter.statuses {
                if !statuses
                    .iter()
                    .any(|s| std::mem::discriminant(s) == std::mem::discriminant(&swap.status))
                {
                    continue;
                }
            }
            out.push(swap);
            if out.len() >= pagination.limit {
                break;
            }
        }
        Ok(out)
    }

    /// `update(id, expectedVersion, fn)` — optimistic concurrency; fails with
    /// `Stale` if `version != expectedVersion`.
    pub fn update<F>(
        &self,
        id: &SwapId,
        expected_version: u64,
        f: F,
    ) -> Result<relay_core::types::Swap, RelayError>
    where
        F: FnOnce(&mut relay_core::types::Swap),
    {
        let mut swap = self
            .get(id)?
            .ok_or_else(|| RelayError::HtlcNotFound(id.to_string()))?;

        if swap.version != expected_version {
            return Err(RelayError::Stale {
                expected: expected_version,
                got: swap.version,
            });
        }

        f(&mut swap);
        swap.version += 1;
        swap.updated_at = Utc::now().timestamp();

        self.swaps
            .insert(id.0, ser(&swap)?)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(swap)
    }

    /// `acquireLock(id, ttl)` — distributed exclusion for the coordinator's
    /// single-worker-per-swap guarantee.
    pub fn acquire_lock(&self, id: &SwapId, ttl_secs: i64) -> Result<Lease<'_>, RelayError> {
        self.locks.acquire(id, ttl_secs)
    }

    // ── Intents ───────────────────────────────────────────────────────────────

    pub fn put_intent(&self, intent: &Intent) -> Result<(), RelayError> {
        let key = intent_key(&intent.swap_id, &intent.step);
        self.intents
            .insert(key, ser(intent)?)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_intent(&self, id: &SwapId, step: &str) -> Result<Option<Intent>, RelayError> {
        let key = intent_key(id, step);
        match self
            .intents
            .get(key)
            .map_err(|e| RelayError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Monitor cursors ───────────────────────────────────────────────────────

    pub fn put_monitor_cursor(&self, cursor: &MonitorCursor) -> Result<(), RelayError> {
        self.monitor_cursors
            .insert(cursor.chain_id.0.as_bytes(), ser(cursor)?)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_monitor_cursor(
        &self,
        chain_id: &ChainId,
    ) -> Result<Option<MonitorCursor>, RelayError> {
        match self
            .monitor_cursors
            .get(chain_id.0.as_bytes())
            .map_err(|e| RelayError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Pool telemetry ────────────────────────────────────────────────────────

    pub fn put_pool_telemetry(
        &self,
        chain_id: &ChainId,
        endpoint_url: &str,
        member: &PoolMember,
    ) -> Result<(), RelayError> {
        let key = telemetry_key(chain_id, endpoint_url);
        self.pool_telemetry
            .insert(key, ser(member)?)
            .map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_pool_telemetry(
        &self,
        chain_id: &ChainId,
        endpoint_url: &str,
    ) -> Result<Option<PoolMember>, RelayError> {
        let key = telemetry_key(chain_id, endpoint_url);
        match self
            .pool_telemetry
            .get(key)
            .map_err(|e| RelayError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(de(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<(), RelayError> {
        self._db.flush().map_err(|e| RelayError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn intent_key(id: &SwapId, step: &str) -> Vec<u8> {
    let mut key = id.0.to_vec();
    key.extend_from_slice(step.as_bytes());
    key
}

fn telemetry_key(chain_id: &ChainId, endpoint_url: &str) -> Vec<u8> {
    let mut key = chain_id.0.as_bytes().to_vec();
    key.push(0);
    key.extend_from_slice(endpoint_url.as_bytes());
    key
}

#[derive(Default)]
pub struct SwapFilter {
    pub statuses: Option<Vec<SwapStatus>>,
}

pub struct Pagination {
    pub after: Option<SwapId>,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            after: None,
            limit: 100,
        }
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize, Debug)]
pub struct MonitorCursor {
    pub chain_id: ChainId,
    pub height: u64,
    pub tx_index: u32,
    pub log_index: u32,
    pub version: u64,
}

impl MonitorCursor {
    /// On restart the monitor resumes from `max(persisted - W, 0)`.
    pub fn resume_height(&self, reorg_window: u64) -> u64 {
        self.height.saturating_sub(reorg_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::{Amount, Secret, SecretAlgo, SwapParty, Timelock};

    fn temp_store() -> SwapStore {
        let dir = tempdir();
        SwapStore::open(dir).unwrap()
    }

    fn tempdir() -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("relay-store-test-{}", rand_suffix()));
        p
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as u64
    }

    fn make_swap(id: [u8; 16]) -> relay_core::types::Swap {
        relay_core::types::Swap {
            id: SwapId(id),
            order_id: None,
            status: SwapStatus::Pending,
            source: SwapParty {
                chain_id: ChainId("evm-1".into()),
                address: relay_core::types::Address("0xabc".into()),
                token: relay_core::types::Denom("weth".into()),
            },
            destination: SwapParty {
                chain_id: ChainId("osmosis-1".into()),
                address: relay_core::types::Address("osmo1xyz".into()),
                token: relay_core::types::Denom("uosmo".into()),
            },
            amount: Amount {
                value: 1_000_000,
                decimals: 6,
                symbol: "OSMO".into(),
            },
            timelock: Timelock::new(1_000, 3_600, 300),
            secret: Secret {
                hash: [1u8; 32],
                preimage: None,
                algo: SecretAlgo::Sha256,
            },
            route: vec![],
            receipts: vec![],
            created_at: 1_000,
            updated_at: 1_000,
            version: 0,
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = temp_store();
        let swap = make_swap([1u8; 16]);
        store.create(&swap).unwrap();
        let loaded = store.get(&swap.id).unwrap().unwrap();
        assert_eq!(loaded.id, swap.id);
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let store = temp_store();
        let swap = make_swap([2u8; 16]);
        store.create(&swap).unwrap();
        assert!(matches!(store.create(&swap), Err(RelayError::Conflict)));
    }

    #[test]
    fn update_rejects_stale_version() {
        let store = temp_store();
        let swap = make_swap([3u8; 16]);
        store.create(&swap).unwrap();
        let err = store.update(&swap.id, 5, |s| s.status = SwapStatus::SourceLocked);
        assert!(matches!(err, Err(RelayError::Stale { .. })));
    }

    #[test]
    fn update_applies_fn_and_bumps_version() {
        let store = temp_store();
        let swap = make_swap([4u8; 16]);
        store.create(&swap).unwrap();
        let updated = store
            .update(&swap.id, 0, |s| s.status = SwapStatus::SourceLocked)
            .unwrap();
        assert_eq!(updated.version, 1);
        assert!(matches!(updated.status, SwapStatus::SourceLocked));
    }

    #[test]
    fn monitor_cursor_resume_height_subtracts_window() {
        let cursor = MonitorCursor {
            chain_id: ChainId("evm-1".into()),
            height: 100,
            tx_index: 0,
            log_index: 0,
            version: 1,
        };
        assert_eq!(cursor.resume_height(12), 88);
        assert_eq!(cursor.resume_height(1000), 0);
    }
}
