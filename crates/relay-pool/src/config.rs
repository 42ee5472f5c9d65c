use relay_core::constants::{
    DEFAULT_CIRCUIT_COOLDOWN_SECS, DEFAULT_CIRCUIT_FAILURE_RATE, DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
    DEFAULT_CIRCUIT_WINDOW_SIZE, DEFAULT_HALF_OPEN_TRIAL_CALLS, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    DEFAULT_MAX_RETRIES, DEFAULT_PROBE_TIMEOUT_MS,
};

/// Tunables for one chain's connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub health_check_interval_secs: i64,
    pub probe_timeout_ms: u64,
    pub max_retries: u32,
    pub circuit_failure_threshold: u32,
    pub circuit_failure_rate: f64,
    pub circuit_window_size: usize,
    pub circuit_cooldown_secs: i64,
    pub half_open_trial_calls: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            circuit_failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            circuit_failure_rate: DEFAULT_CIRCUIT_FAILURE_RATE,
            circuit_window_size: DEFAULT_CIRCUIT_WINDOW_SIZE,
            circuit_cooldown_secs: DEFAULT_CIRCUIT_COOLDOWN_SECS,
            half_open_trial_calls: DEFAULT_HALF_OPEN_TRIAL_CALLS,
        }
    }
}
