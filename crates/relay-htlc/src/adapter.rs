use std::sync::Arc;

use chrono::Utc;
use relay_core::error::RelayError;
use relay_core::types::{ChainId, Event, EventKind, SecretAlgo};

use crate::collaborators::{AdapterFuture, Querier, TxSubmitter};
use crate::precondition::{check_refund, check_withdraw};
use crate::types::{AdapterKind, CreateHtlcRequest, HtlcRecord, TxOutcome};

/// Per-chain-kind HTLC operations. Preconditions are enforced before
/// submission; violations return a typed error and never reach the
/// collaborator.
pub struct EvmHtlcAdapter {
    pub submitter: Arc<dyn TxSubmitter>,
    pub querier: Arc<dyn Querier>,
}

pub struct CosmosHtlcAdapter {
    pub submitter: Arc<dyn TxSubmitter>,
    pub querier: Arc<dyn Querier>,
}

/// Explicit capability-set dispatch over chain kinds, in place of a
/// duck-typed client: the coordinator matches on `ChainAdapter` rather than
/// calling through a trait object.
pub enum ChainAdapter {
    Evm(EvmHtlcAdapter),
    Cosmos(CosmosHtlcAdapter),
}

impl ChainAdapter {
    pub fn kind(&self) -> AdapterKind {
        match self {
            ChainAdapter::Evm(_) => AdapterKind::Evm,
            ChainAdapter::Cosmos(_) => AdapterKind::Cosmos,
        }
    }

    pub async fn create_htlc(
        &self,
        chain_id: &ChainId,
        req: CreateHtlcRequest,
        payload_encoder: impl FnOnce(&CreateHtlcRequest) -> Vec<u8>,
    ) -> Result<TxOutcome, RelayError> {
        let (submitter, _querier) = self.collaborators();
        let payload = payload_encoder(&req);
        submitter.submit(chain_id, payload).await
    }

    pub async fn withdraw(
        &self,
        chain_id: &ChainId,
        htlc_id: &str,
        preimage: [u8; 32],
        algo: SecretAlgo,
    ) -> Result<TxOutcome, RelayError> {
        let (submitter, querier) = self.collaborators();
        let record = querier
            .query_htlc(chain_id, htlc_id)
            .await?
            .ok_or_else(|| RelayError::HtlcNotFound(htlc_id.to_string()))?;
        check_withdraw(&record, Utc::now().timestamp())?;
        // S4: any withdraw with a preimage that doesn't hash to the committed
        // value is rejected before it ever reaches the collaborator.
        if !relay_crypto::verify_preimage(algo, &preimage, &record.hashlock) {
            return Err(RelayError::InvalidSecret);
        }

        let payload = encode_withdraw(htlc_id, &preimage);
        submitter.submit(chain_id, payload).await
    }

    pub async fn refund(&self, chain_id: &ChainId, htlc_id: &str) -> Result<TxOutcome, RelayError> {
        let (submitter, querier) = self.collaborators();
        let record = querier
            .query_htlc(chain_id, htlc_id)
            .await?
            .ok_or_else(|| RelayError::HtlcNotFound(htlc_id.to_string()))?;
        check_refund(&record, Utc::now().timestamp())?;

        let payload = encode_refund(htlc_id);
        submitter.submit(chain_id, payload).await
    }

    pub fn get_htlc<'a>(&'a self, chain_id: &'a ChainId, htlc_id: &'a str) -> AdapterFuture<Option<HtlcRecord>> {
        let (_submitter, querier) = self.collaborators();
        querier.query_htlc(chain_id, htlc_id)
    }

    /// Whether the identifier used by a prior submission attempt has since
    /// been consumed on-chain, independent of whether the HTLC it targeted
    /// is visible yet. Used to avoid resubmitting a stuck intent blindly.
    pub fn nonce_consumed<'a>(&'a self, chain_id: &'a ChainId, nonce_or_seq: &'a str) -> AdapterFuture<bool> {
        let (submitter, _querier) = self.collaborators();
        submitter.nonce_consumed(chain_id, nonce_or_seq)
    }

    fn collaborators(&self) -> (&Arc<dyn TxSubmitter>, &Arc<dyn Querier>) {
        match self {
            ChainAdapter::Evm(a) => (&a.submitter, &a.querier),
            ChainAdapter::Cosmos(a) => (&a.submitter, &a.querier),
        }
    }
}

fn encode_withdraw(htlc_id: &str, preimage: &[u8; 32]) -> Vec<u8> {
    let mut payload = htlc_id.as_bytes().to_vec();
    payload.extend_from_slice(preimage);
    payload
}

fn encode_refund(htlc_id: &str) -> Vec<u8> {
    htlc_id.as_bytes().to_vec()
}

/// Extracts a C2 event from a confirmed tx outcome. Chain-specific payload
/// decoding (e.g. EVM log topics vs Cosmos `DeliverTxResponse`/`IndexedTx`
/// attributes) lives in the real collaborator; this just assembles the
/// canonical `Event` envelope once the kind is known.
pub fn tx_outcome_to_event(
    chain_id: &ChainId,
    outcome: &TxOutcome,
    kind: EventKind,
    log_index: u32,
    payload: serde_json::Value,
) -> Event {
    Event {
        chain_id: chain_id.clone(),
        kind,
        block_height: outcome.block_height,
        tx_index: 0,
        log_index,
        tx_hash: outcome.tx_hash.clone(),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeSubmitter {
        outcome: TxOutcome,
    }
    impl TxSubmitter for FakeSubmitter {
        fn submit(&self, _chain_id: &ChainId, _payload: Vec<u8>) -> AdapterFuture<TxOutcome> {
            let outcome = self.outcome.clone();
            Box::pin(async move { Ok(outcome) })
        }
        fn nonce_consumed(&self, _chain_id: &ChainId, _nonce_or_seq: &str) -> AdapterFuture<bool> {
            Box::pin(async move { Ok(true) })
        }
    }

    struct FakeQuerier {
        record: Mutex<Option<HtlcRecord>>,
    }
    impl Querier for FakeQuerier {
        fn query_htlc(&self, _chain_id: &ChainId, _htlc_id: &str) -> AdapterFuture<Option<HtlcRecord>> {
            let record = self.record.lock().unwrap().clone();
            Box::pin(async move { Ok(record) })
        }
        fn current_height(&self, _chain_id: &ChainId) -> AdapterFuture<u64> {
            Box::pin(async move { Ok(100) })
        }
    }

    fn adapter(record: HtlcRecord) -> ChainAdapter {
        ChainAdapter::Evm(EvmHtlcAdapter {
            submitter: Arc::new(FakeSubmitter {
                outcome: TxOutcome {
                    tx_hash: "0xabc".into(),
                    block_height: 10,
                    confirmations: 12,
                },
            }),
            querier: Arc::new(FakeQuerier {
                record: Mutex::new(Some(record)),
            }),
        })
    }

    #[tokio::test]
    async fn withdraw_rejected_when_already_withdrawn() {
        let chain = ChainId("evm-1".into());
        let a = adapter(HtlcRecord {
            htlc_id: "h1".into(),
            hashlock: [0u8; 32],
            timelock: i64::MAX,
            withdrawn: true,
            refunded: false,
        });
        let result = a.withdraw(&chain, "h1", [1u8; 32], SecretAlgo::Sha256).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn withdraw_rejected_when_preimage_does_not_match_hashlock() {
        let chain = ChainId("evm-1".into());
        let preimage = [9u8; 32];
        let hashlock = relay_crypto::hash_preimage(SecretAlgo::Sha256, &preimage);
        let a = adapter(HtlcRecord {
            htlc_id: "h1".into(),
            hashlock,
            timelock: i64::MAX,
            withdrawn: false,
            refunded: false,
        });
        let wrong_preimage = [1u8; 32];
        let result = a.withdraw(&chain, "h1", wrong_preimage, SecretAlgo::Sha256).await;
        assert!(matches!(result, Err(RelayError::InvalidSecret)));
    }

    #[tokio::test]
    async fn withdraw_accepted_when_preimage_matches_hashlock() {
        let chain = ChainId("evm-1".into());
        let preimage = [9u8; 32];
        let hashlock = relay_crypto::hash_preimage(SecretAlgo::Sha256, &preimage);
        let a = adapter(HtlcRecord {
            htlc_id: "h1".into(),
            hashlock,
            timelock: i64::MAX,
            withdrawn: false,
            refunded: false,
        });
        let result = a.withdraw(&chain, "h1", preimage, SecretAlgo::Sha256).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn refund_rejected_before_timelock_passes() {
        let chain = ChainId("evm-1".into());
        let a = adapter(HtlcRecord {
            htlc_id: "h1".into(),
            hashlock: [0u8; 32],
            timelock: i64::MAX,
            withdrawn: false,
            refunded: false,
        });
        let result = a.refund(&chain, "h1").await;
        assert!(result.is_err());
    }
}
