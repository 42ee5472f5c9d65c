use relay_core::types::{SwapId, Timestamp};
use serde::{Deserialize, Serialize};

/// Recorded before a chain call is submitted, so a restart can resume by
/// polling rather than blindly resubmitting (the idempotency contract of the
/// swap coordinator, §4.5).
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Intent {
    pub swap_id: SwapId,
    /// Transition tag, e.g. `"source_withdraw"`, `"hop_2_create"`.
    pub step: String,
    pub tx_attempt: u32,
    pub nonce_or_seq: Option<String>,
    pub created_at: Timestamp,
    /// Set once the submitted tx's receipt has been observed.
    pub receipt_tx_hash: Option<String>,
    /// Earliest time the next attempt for this step may be submitted.
    /// Advanced by the coordinator's backoff schedule on each failed attempt.
    pub next_retry_at: Timestamp,
}

impl Intent {
    pub fn new(swap_id: SwapId, step: impl Into<String>, tx_attempt: u32, now: Timestamp) -> Self {
        Self {
            swap_id,
            step: step.into(),
            tx_attempt,
            nonce_or_seq: None,
            created_at: now,
            receipt_tx_hash: None,
            next_retry_at: now,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.receipt_tx_hash.is_some()
    }
}
