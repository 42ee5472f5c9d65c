use std::future::Future;
use std::pin::Pin;

use relay_core::error::RelayError;
use relay_core::types::{ChainId, Event};

pub type MonitorFuture<T> = Pin<Box<dyn Future<Output = Result<T, RelayError>> + Send>>;

/// Opaque collaborator over a chain's RPC surface — the wire protocol used
/// to fetch blocks and logs is out of scope, same boundary as the HTLC
/// adapters' `TxSubmitter`/`Querier`.
pub trait ChainSource: Send + Sync {
    fn current_height(&self, chain_id: &ChainId) -> MonitorFuture<u64>;
    fn block_hash(&self, chain_id: &ChainId, height: u64) -> MonitorFuture<[u8; 32]>;
    fn fetch_events(&self, chain_id: &ChainId, height: u64) -> MonitorFuture<Vec<Event>>;
}
