use chrono::Utc;
use relay_core::error::RelayError;
use relay_core::types::{SwapId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug)]
struct LockRecord {
    token: u64,
    expires_at: Timestamp,
}

/// Sled-backed exclusive lock table keyed by `SwapId`, so the coordinator's
/// single-worker-per-swap guarantee survives a process restart.
pub(crate) struct LockTable {
    tree: sled::Tree,
}

impl LockTable {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn acquire(&self, id: &SwapId, ttl_secs: i64) -> Result<Lease<'_>, RelayError> {
        let now = Utc::now().timestamp();
        let token = rand::random::<u64>();

        loop {
            let current = self
                .tree
                .get(id.0)
                .map_err(|e| RelayError::Storage(e.to_string()))?;

            let held = match &current {
                Some(bytes) => {
                    let existing: LockRecord = bincode::deserialize(bytes)
                        .map_err(|e| RelayError::Serialization(e.to_string()))?;
                    existing.expires_at > now
                }
                None => false,
            };
            if held {
                return Err(RelayError::LeaseContended);
            }

            let new_record = LockRecord {
                token,
                expires_at: now + ttl_secs,
            };
            let new_bytes = bincode::serialize(&new_record)
                .map_err(|e| RelayError::Serialization(e.to_string()))?;

            let swapped = self
                .tree
                .compare_and_swap(id.0, current, Some(new_bytes))
                .map_err(|e| RelayError::Storage(e.to_string()))?;

            if swapped.is_ok() {
                return Ok(Lease {
                    tree: &self.tree,
                    id: id.clone(),
                    token,
                    released: false,
                });
            }
            // Lost the CAS race to another worker; retry from scratch.
        }
    }
}

/// Held lease for one swap. Released on drop.
pub struct Lease<'a> {
    tree: &'a sled::Tree,
    id: SwapId,
    token: u64,
    released: bool,
}

impl Lease<'_> {
    pub fn release(mut self) {
        self.do_release();
        self.released = true;
    }

    fn do_release(&mut self) {
        if self.released {
            return;
        }
        if let Ok(Some(bytes)) = self.tree.get(self.id.0) {
            if let Ok(record) = bincode::deserialize::<LockRecord>(&bytes) {
                if record.token == self.token {
                    let _ = self.tree.remove(self.id.0);
                }
            }
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.do_release();
    }
}
