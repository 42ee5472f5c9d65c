use std::collections::VecDeque;

use relay_core::types::{CircuitState, Timestamp};

use crate::config::PoolConfig;

/// Per-member circuit breaker: Closed -> Open on `k` consecutive failures or
/// a failure rate above threshold over a sliding window; Open -> HalfOpen
/// after cooldown; HalfOpen -> Closed on a success, -> Open on a failure.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    consecutive_failures: u32,
    window: VecDeque<bool>,
    window_size: usize,
    failure_threshold: u32,
    failure_rate: f64,
    cooldown_secs: i64,
    opened_at: Option<Timestamp>,
    half_open_trials_done: u32,
    half_open_trial_calls: u32,
}

impl CircuitBreaker {
    pub fn new(cfg: &PoolConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            window: VecDeque::with_capacity(cfg.circuit_window_size),
            window_size: cfg.circuit_window_size,
            failure_threshold: cfg.circuit_failure_threshold,
            failure_rate: cfg.circuit_failure_rate,
            cooldown_secs: cfg.circuit_cooldown_secs,
            opened_at: None,
            half_open_trials_done: 0,
            half_open_trial_calls: cfg.half_open_trial_calls,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Whether a probe while Open should be allowed through as a trial call.
    /// Probes made while Open do not count toward application load.
    pub fn ready_for_trial(&self, now: Timestamp) -> bool {
        match self.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => self
                .opened_at
                .map(|t| now - t >= self.cooldown_secs)
                .unwrap_or(false),
        }
    }

    /// Call before issuing a probe while Open; transitions Open -> HalfOpen
    /// once the cooldown has elapsed.
    pub fn enter_half_open_if_due(&mut self, now: Timestamp) {
        if self.state == CircuitState::Open && self.ready_for_trial(now) {
            self.state = CircuitState::HalfOpen;
            self.half_open_trials_done = 0;
        }
    }

    pub fn record_success(&mut self, now: Timestamp) {
        self.push_window(true);
        match self.state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                self.half_open_trials_done += 1;
                if self.half_open_trials_done >= self.half_open_trial_calls {
                    self.state = CircuitState::Closed;
                    self.consecutive_failures = 0;
                    self.opened_at = None;
                }
            }
            CircuitState::Open => {
                self.enter_half_open_if_due(now);
            }
        }
    }

    pub fn record_failure(&mut self, now: Timestamp) {
        self.push_window(false);
        self.consecutive_failures += 1;
        match self.state {
            CircuitState::Closed => {
                if self.consecutive_failures >= self.failure_threshold || self.window_failure_rate() > self.failure_rate {
                    self.trip(now);
                }
            }
            CircuitState::HalfOpen => {
                self.trip(now);
            }
            CircuitState::Open => {}
        }
    }

    fn trip(&mut self, now: Timestamp) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.half_open_trials_done = 0;
    }

    fn push_window(&mut self, success: bool) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(success);
    }

    fn window_failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|ok| !**ok).count();
        failures as f64 / self.window.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> PoolConfig {
        PoolConfig {
            circuit_failure_threshold: 3,
            circuit_failure_rate: 0.9,
            circuit_window_size: 10,
            circuit_cooldown_secs: 30,
            half_open_trial_calls: 1,
            ..PoolConfig::default()
        }
    }

    #[test]
    fn trips_open_after_k_consecutive_failures() {
        let mut cb = CircuitBreaker::new(&cfg());
        cb.record_failure(0);
        cb.record_failure(0);
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure(0);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn open_to_half_open_after_cooldown() {
        let mut cb = CircuitBreaker::new(&cfg());
        for _ in 0..3 {
            cb.record_failure(1_000);
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.ready_for_trial(1_010));
        assert!(cb.ready_for_trial(1_031));
        cb.enter_half_open_if_due(1_031);
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_closes_on_success_opens_on_failure() {
        let mut cb = CircuitBreaker::new(&cfg());
        for _ in 0..3 {
            cb.record_failure(0);
        }
        cb.enter_half_open_if_due(31);
        cb.record_success(31);
        assert_eq!(cb.state(), CircuitState::Closed);

        let mut cb2 = CircuitBreaker::new(&cfg());
        for _ in 0..3 {
            cb2.record_failure(0);
        }
        cb2.enter_half_open_if_due(31);
        cb2.record_failure(31);
        assert_eq!(cb2.state(), CircuitState::Open);
    }
}
