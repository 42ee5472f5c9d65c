//! Concrete chain collaborators wired at startup.
//!
//! `relay-pool`, `relay-htlc` and `relay-monitor` all treat the chain's wire
//! protocol as an opaque capability supplied by the caller — none of those
//! crates speak EVM JSON-RPC or a Cosmos LCD themselves. This module is
//! that capability: a thin JSON-RPC-over-HTTP client in the same vein as
//! `chronx-wallet`'s `WalletRpcClient`, routed through a chain's
//! `ConnectionPool` so retries and circuit breaking apply uniformly.
//!
//! The method names below (`chain_height`, `chain_blockHash`, ...) are a
//! placeholder wire contract: a real deployment replaces this module with
//! one that speaks the target chain's actual RPC dialect per chain kind.

use std::sync::Arc;

use relay_core::error::RelayError;
use relay_core::types::{ChainId, Event};
use relay_htlc::{AdapterFuture, CreateHtlcRequest, HtlcRecord, Querier, TxOutcome, TxSubmitter};
use relay_monitor::{ChainSource, MonitorFuture};
use relay_pool::{ConnectionPool, Prober, ProbeFuture};

async fn rpc_call(
    client: &reqwest::Client,
    endpoint: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, RelayError> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });

    let resp = client
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| RelayError::ChainUnreachable(e.to_string()))?;

    let json: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| RelayError::ChainUnreachable(e.to_string()))?;

    if let Some(err) = json.get("error") {
        return Err(RelayError::ChainUnreachable(err.to_string()));
    }
    Ok(json["result"].clone())
}

/// Liveness probe used by `ConnectionPool::run_health_checks`.
pub struct RpcProber {
    client: reqwest::Client,
}

impl RpcProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Prober for RpcProber {
    fn probe(&self, endpoint: &str) -> ProbeFuture {
        let client = self.client.clone();
        let endpoint = endpoint.to_string();
        Box::pin(async move {
            let started = std::time::Instant::now();
            rpc_call(&client, &endpoint, "chain_height", serde_json::json!([])).await?;
            Ok(started.elapsed())
        })
    }
}

/// `TxSubmitter` + `Querier` for one chain, backed by its `ConnectionPool`.
pub struct RpcAdapter {
    pool: Arc<ConnectionPool>,
    client: reqwest::Client,
}

impl RpcAdapter {
    pub fn new(pool: Arc<ConnectionPool>, client: reqwest::Client) -> Self {
        Self { pool, client }
    }
}

impl TxSubmitter for RpcAdapter {
    fn submit(&self, chain_id: &ChainId, payload: Vec<u8>) -> AdapterFuture<TxOutcome> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let chain_id = chain_id.clone();
        let payload_hex = hex::encode(&payload);
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let payload_hex = payload_hex.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result = rpc_call(
                        &client,
                        &endpoint,
                        "chain_submitTx",
                        serde_json::json!([payload_hex]),
                    )
                    .await?;
                    serde_json::from_value(result).map_err(|e| {
                        RelayError::Other(format!("decoding submit response for {chain_id}: {e}"))
                    })
                }
            })
            .await
        })
    }

    fn nonce_consumed(&self, chain_id: &ChainId, nonce_or_seq: &str) -> AdapterFuture<bool> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let nonce_or_seq = nonce_or_seq.to_string();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let nonce_or_seq = nonce_or_seq.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result = rpc_call(
                        &client,
                        &endpoint,
                        "chain_nonceConsumed",
                        serde_json::json!([nonce_or_seq]),
                    )
                    .await?;
                    result.as_bool().ok_or_else(|| {
                        RelayError::Other(format!("expected bool from {chain_id}"))
                    })
                }
            })
            .await
        })
    }
}

impl Querier for RpcAdapter {
    fn query_htlc(&self, chain_id: &ChainId, htlc_id: &str) -> AdapterFuture<Option<HtlcRecord>> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let htlc_id = htlc_id.to_string();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let htlc_id = htlc_id.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result = rpc_call(
                        &client,
                        &endpoint,
                        "chain_getHtlc",
                        serde_json::json!([htlc_id]),
                    )
                    .await?;
                    if result.is_null() {
                        return Ok(None);
                    }
                    serde_json::from_value(result).map(Some).map_err(|e| {
                        RelayError::Other(format!("decoding htlc record for {chain_id}: {e}"))
                    })
                }
            })
            .await
        })
    }

    fn current_height(&self, chain_id: &ChainId) -> AdapterFuture<u64> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result =
                        rpc_call(&client, &endpoint, "chain_height", serde_json::json!([])).await?;
                    result
                        .as_u64()
                        .ok_or_else(|| RelayError::Other(format!("expected height from {chain_id}")))
                }
            })
            .await
        })
    }
}

/// `ChainSource` for one chain's event monitor, backed by its `ConnectionPool`.
pub struct RpcChainSource {
    pool: Arc<ConnectionPool>,
    client: reqwest::Client,
}

impl RpcChainSource {
    pub fn new(pool: Arc<ConnectionPool>, client: reqwest::Client) -> Self {
        Self { pool, client }
    }
}

impl ChainSource for RpcChainSource {
    fn current_height(&self, chain_id: &ChainId) -> MonitorFuture<u64> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result =
                        rpc_call(&client, &endpoint, "chain_height", serde_json::json!([])).await?;
                    result
                        .as_u64()
                        .ok_or_else(|| RelayError::Other(format!("expected height from {chain_id}")))
                }
            })
            .await
        })
    }

    fn block_hash(&self, chain_id: &ChainId, height: u64) -> MonitorFuture<[u8; 32]> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result = rpc_call(
                        &client,
                        &endpoint,
                        "chain_blockHash",
                        serde_json::json!([height]),
                    )
                    .await?;
                    let hex_str = result
                        .as_str()
                        .ok_or_else(|| RelayError::Other(format!("expected hash hex from {chain_id}")))?;
                    let bytes = hex::decode(hex_str)
                        .map_err(|e| RelayError::Other(format!("invalid block hash hex: {e}")))?;
                    if bytes.len() != 32 {
                        return Err(RelayError::Other("block hash must be 32 bytes".into()));
                    }
                    let mut hash = [0u8; 32];
                    hash.copy_from_slice(&bytes);
                    Ok(hash)
                }
            })
            .await
        })
    }

    fn fetch_events(&self, chain_id: &ChainId, height: u64) -> MonitorFuture<Vec<Event>> {
        let pool = self.pool.clone();
        let client = self.client.clone();
        let chain_id = chain_id.clone();
        Box::pin(async move {
            pool.with_client(|endpoint| {
                let client = client.clone();
                let chain_id = chain_id.clone();
                async move {
                    let result = rpc_call(
                        &client,
                        &endpoint,
                        "chain_getEvents",
                        serde_json::json!([height]),
                    )
                    .await?;
                    serde_json::from_value(result).map_err(|e| {
                        RelayError::Other(format!("decoding events for {chain_id}: {e}"))
                    })
                }
            })
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_call_surfaces_server_side_error_field() {
        let client = reqwest::Client::new();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let result = rt.block_on(rpc_call(
            &client,
            "http://127.0.0.1:0",
            "chain_height",
            serde_json::json!([]),
        ));
        assert!(result.is_err());
    }
}
