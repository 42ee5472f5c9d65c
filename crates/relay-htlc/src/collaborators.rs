//! Narrow interfaces to chain-specific SDKs, consumed as opaque
//! collaborators. Neither the wire format nor the signing scheme of any
//! particular chain is modeled here — that's explicitly out of scope.

use std::future::Future;
use std::pin::Pin;

use relay_core::error::RelayError;
use relay_core::types::ChainId;

use crate::types::{HtlcRecord, TxOutcome};

pub type AdapterFuture<T> = Pin<Box<dyn Future<Output = Result<T, RelayError>> + Send>>;

/// Submits a raw, already-encoded transaction to a chain and blocks until it
/// is included (the adapter layer above is responsible for confirmation
/// depth and nonce/sequence bookkeeping).
pub trait TxSubmitter: Send + Sync {
    fn submit(&self, chain_id: &ChainId, payload: Vec<u8>) -> AdapterFuture<TxOutcome>;

    /// Whether the identifier (`nonce` for EVM, `sequence` for Cosmos) used
    /// by a prior attempt has since been consumed on-chain. Used to decide
    /// whether a stuck intent may be resubmitted.
    fn nonce_consumed(&self, chain_id: &ChainId, nonce_or_seq: &str) -> AdapterFuture<bool>;
}

/// Read-only chain queries.
pub trait Querier: Send + Sync {
    fn query_htlc(&self, chain_id: &ChainId, htlc_id: &str) -> AdapterFuture<Option<HtlcRecord>>;
    fn current_height(&self, chain_id: &ChainId) -> AdapterFuture<u64>;
}
