use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use relay_core::error::RelayError;
use relay_core::types::{ChainId, PoolMember, Timestamp};

use crate::config::PoolConfig;
use crate::member::MemberState;
use crate::prober::Prober;

fn now_ts() -> Timestamp {
    Utc::now().timestamp()
}

/// Per-chain pool of RPC endpoints with health checks, circuit breakers and
/// round-robin-with-latency-bias selection.
pub struct ConnectionPool {
    chain_id: ChainId,
    config: PoolConfig,
    members: Mutex<Vec<MemberState>>,
    next_index: AtomicUsize,
    prober: Arc<dyn Prober>,
}

/// A held endpoint. Dropping the lease releases it back to the pool.
pub struct Lease<'p> {
    pool: &'p ConnectionPool,
    index: usize,
    pub endpoint_url: String,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Ok(mut members) = self.pool.members.try_lock() {
            if let Some(m) = members.get_mut(self.index) {
                m.in_flight = m.in_flight.saturating_sub(1);
            }
        }
    }
}

impl ConnectionPool {
    pub fn new(
        chain_id: ChainId,
        endpoints: Vec<String>,
        config: PoolConfig,
        prober: Arc<dyn Prober>,
    ) -> Self {
        let members = endpoints
            .into_iter()
            .map(|e| MemberState::new(e, &config))
            .collect();
        Self {
            chain_id,
            config,
            members: Mutex::new(members),
            next_index: AtomicUsize::new(0),
            prober,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// `acquire(chainId, capability)` from the contract: `capability` is
    /// implicit here since one pool instance already scopes one chain and
    /// one protocol.
    pub async fn acquire(&self) -> Result<Lease<'_>, RelayError> {
        let now = now_ts();
        let mut members = self.members.lock().await;
        let n = members.len();
        if n == 0 {
            return Err(RelayError::NoHealthyEndpoint(self.chain_id.0.clone()));
        }

        let start = self.next_index.fetch_add(1, Ordering::Relaxed) % n;
        let mut best: Option<(usize, f64)> = None;
        for offset in 0..n {
            let idx = (start + offset) % n;
            let m = &members[idx];
            if !m.is_healthy(now, self.config.health_check_interval_secs) {
                continue;
            }
            let weight = m.selection_weight();
            if best.map(|(_, bw)| weight > bw).unwrap_or(true) {
                best = Some((idx, weight));
            }
        }

        let idx = best.ok_or_else(|| RelayError::NoHealthyEndpoint(self.chain_id.0.clone()))?;
        let idx = idx.0;
        members[idx].in_flight += 1;
        let endpoint_url = members[idx].endpoint_url.clone();
        drop(members);

        Ok(Lease {
            pool: self,
            index: idx,
            endpoint_url,
        })
    }

    /// `withClient(chainId, op)`: acquire, run `op`, release, retrying
    /// transport failures on a different member up to `maxRetries`.
    pub async fn with_client<T, F, Fut>(&self, op: F) -> Result<T, RelayError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
    {
        let mut last_err = RelayError::NoHealthyEndpoint(self.chain_id.0.clone());
        let mut tried: HashSet<usize> = HashSet::new();

        for attempt in 0..=self.config.max_retries {
            let lease = self.acquire().await?;
            if !tried.insert(lease.index) && tried.len() == 1 && attempt > 0 {
                // Only one healthy member exists; further retries would hit
                // the same endpoint. Stop early rather than loop pointlessly.
                return Err(last_err);
            }

            match op(lease.endpoint_url.clone()).await {
                Ok(value) => {
                    self.record_success(lease.index).await;
                    return Ok(value);
                }
                Err(err) => {
                    self.record_failure(lease.index, err.to_string()).await;
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    async fn record_success(&self, index: usize) {
        let now = now_ts();
        let mut members = self.members.lock().await;
        if let Some(m) = members.get_mut(index) {
            m.breaker.record_success(now);
        }
    }

    async fn record_failure(&self, index: usize, error: String) {
        let now = now_ts();
        let mut members = self.members.lock().await;
        if let Some(m) = members.get_mut(index) {
            m.breaker.record_failure(now);
            m.last_error = Some(error);
        }
    }

    /// Current member snapshots, for `/health` and telemetry persistence.
    pub async fn snapshot(&self) -> Vec<PoolMember> {
        self.members.lock().await.iter().map(|m| m.snapshot()).collect()
    }

    /// Runs health probes forever at `health_check_interval_secs`. Intended
    /// to be spawned as a dedicated task per chain pool.
    pub async fn run_health_checks(&self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(
            self.config.health_check_interval_secs.max(1) as u64,
        ));
        loop {
            ticker.tick().await;
            self.probe_all_due().await;
        }
    }

    async fn probe_all_due(&self) {
        let now = now_ts();
        let endpoints: Vec<(usize, String)> = {
            let mut members = self.members.lock().await;
            for m in members.iter_mut() {
                m.breaker.enter_half_open_if_due(now);
            }
            members
                .iter()
                .enumerate()
                .map(|(i, m)| (i, m.endpoint_url.clone()))
                .collect()
        };

        for (index, endpoint) in endpoints {
            let started = Instant::now();
            let probe_timeout = Duration::from_millis(self.config.probe_timeout_ms);
            let result = timeout(probe_timeout, self.prober.probe(&endpoint)).await;

            let mut members = self.members.lock().await;
            let Some(member) = members.get_mut(index) else { continue };
            match result {
                Ok(Ok(_)) => {
                    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                    member.record_probe_success(now, latency_ms);
                    debug!(endpoint = %endpoint, chain = %self.chain_id, latency_ms, "probe ok");
                }
                Ok(Err(e)) => {
                    warn!(endpoint = %endpoint, chain = %self.chain_id, error = %e, "probe failed");
                    member.record_probe_failure(now, e.to_string());
                }
                Err(_) => {
                    warn!(endpoint = %endpoint, chain = %self.chain_id, "probe timed out");
                    member.record_probe_failure(now, "probe timeout".into());
                }
            }
        }
        info!(chain = %self.chain_id, "health check sweep complete");
    }
}
