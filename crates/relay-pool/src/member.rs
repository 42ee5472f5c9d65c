use relay_core::types::{CircuitState, PoolMember, Timestamp};

use crate::circuit::CircuitBreaker;
use crate::config::PoolConfig;

/// Internal per-endpoint bookkeeping: the wire-visible `PoolMember` snapshot
/// plus the circuit breaker and latency EMA used for selection.
pub(crate) struct MemberState {
    pub endpoint_url: String,
    pub in_flight: u32,
    pub last_error: Option<String>,
    pub breaker: CircuitBreaker,
    /// Exponential moving average of observed latency, in milliseconds.
    pub ema_latency_ms: f64,
    pub last_probe_at: Option<Timestamp>,
}

const EMA_ALPHA: f64 = 0.2;

impl MemberState {
    pub fn new(endpoint_url: String, cfg: &PoolConfig) -> Self {
        Self {
            endpoint_url,
            in_flight: 0,
            last_error: None,
            breaker: CircuitBreaker::new(cfg),
            ema_latency_ms: 0.0,
            last_probe_at: None,
        }
    }

    pub fn is_healthy(&self, now: Timestamp, health_check_interval_secs: i64) -> bool {
        self.breaker.state() == CircuitState::Closed
            && self
                .last_probe_at
                .map(|t| now - t <= health_check_interval_secs)
                .unwrap_or(false)
    }

    pub fn record_probe_success(&mut self, now: Timestamp, latency_ms: f64) {
        self.last_probe_at = Some(now);
        self.breaker.record_success(now);
        self.last_error = None;
        if self.ema_latency_ms == 0.0 {
            self.ema_latency_ms = latency_ms;
        } else {
            self.ema_latency_ms = EMA_ALPHA * latency_ms + (1.0 - EMA_ALPHA) * self.ema_latency_ms;
        }
    }

    pub fn record_probe_failure(&mut self, now: Timestamp, error: String) {
        self.last_probe_at = Some(now);
        self.breaker.record_failure(now);
        self.last_error = Some(error);
    }

    /// Selection weight: inverse of EMA latency, biasing round robin toward
    /// faster members. Unmeasured members (latency 0) get the max weight so
    /// they are tried at least once.
    pub fn selection_weight(&self) -> f64 {
        if self.ema_latency_ms <= 0.0 {
            1.0
        } else {
            1.0 / self.ema_latency_ms
        }
    }

    pub fn snapshot(&self) -> PoolMember {
        PoolMember {
            endpoint_url: self.endpoint_url.clone(),
            healthy: self.breaker.state() == CircuitState::Closed,
            in_flight: self.in_flight,
            last_error: self.last_error.clone(),
            circuit_state: self.breaker.state(),
            next_retry_at: None,
        }
    }
}
