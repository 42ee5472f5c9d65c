//! ─── Relay Protocol Constants ───────────────────────────────────────────────
//!
//! Shared defaults referenced by the route planner, coordinator, pool and
//! shield. Per-deployment values live in `RelayConfig` (see `relay-node`);
//! these are the fallbacks used when a config omits a field.

// ── Route planning (C3) ──────────────────────────────────────────────────────

/// Default maximum hop count for a computed route.
pub const DEFAULT_MAX_HOPS: usize = 4;

/// Minimum timelock buffer between consecutive hops, in seconds.
pub const DEFAULT_MIN_HOP_BUFFER_SECS: i64 = 1_800;

/// Minimum timelock the final (destination) hop must retain.
pub const DEFAULT_MIN_DEST_TIMELOCK_SECS: i64 = 3_600;

/// Route cost weights: `hopCost = ALPHA*estRelayTime + BETA*fee + GAMMA*riskScore`.
pub const ROUTE_COST_ALPHA: f64 = 1.0;
pub const ROUTE_COST_BETA: f64 = 1.0;
pub const ROUTE_COST_GAMMA: f64 = 1.0;

// ── Connection pool (C1) ─────────────────────────────────────────────────────

/// Consecutive failures before a circuit trips from Closed to Open.
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;

/// Failure-rate threshold (0.0-1.0) over the sliding window that also trips
/// the circuit, independent of the consecutive-failure count.
pub const DEFAULT_CIRCUIT_FAILURE_RATE: f64 = 0.5;

/// Sliding window size (request count) used for the failure-rate check.
pub const DEFAULT_CIRCUIT_WINDOW_SIZE: usize = 20;

/// Cooldown before an Open circuit is probed again (HalfOpen).
pub const DEFAULT_CIRCUIT_COOLDOWN_SECS: i64 = 30;

/// Health-probe interval for pool members.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: i64 = 15;

/// Max time a health probe may take before counting as a failure.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Max retries on a different pool member before surfacing a transport error.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Trial calls allowed in HalfOpen before deciding Closed/Open.
/// Open question (see DESIGN.md): deployments may raise this above 1.
pub const DEFAULT_HALF_OPEN_TRIAL_CALLS: u32 = 1;

// ── Event monitors (C2) ──────────────────────────────────────────────────────

/// Default reorg window size (blocks kept for rewind detection).
pub const DEFAULT_REORG_WINDOW: u64 = 12;

/// Downstream buffer size at which a monitor pauses pulling new blocks.
pub const DEFAULT_HIGH_WATERMARK: usize = 1_000;

// ── Swap coordinator (C5) ────────────────────────────────────────────────────

/// Max retry attempts per drive-loop step before declaring the step exhausted.
pub const DEFAULT_MAX_STEP_RETRIES: u32 = 5;

/// Base backoff for exponential-with-full-jitter retry, in milliseconds.
pub const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

/// Default lease TTL for the per-swap exclusive lock.
pub const DEFAULT_LEASE_TTL_SECS: i64 = 30;

// ── Recovery engine (C7) ─────────────────────────────────────────────────────

/// Sweep interval for the recovery engine.
pub const DEFAULT_RECOVERY_SWEEP_INTERVAL_SECS: i64 = 60;

/// A swap's deadline is considered "imminent" within this window.
pub const DEFAULT_RECOVERY_IMMINENT_WINDOW_SECS: i64 = 300;

// ── DDoS shield (C8) ─────────────────────────────────────────────────────────

pub const DEFENSE_LEVEL_MIN: u8 = 1;
pub const DEFENSE_LEVEL_MAX: u8 = 5;

/// Score weights: `S = W_VOLUME*V + W_PATTERN*P + W_REPUTATION*R + W_RESOURCE*Res + W_GEO*Geo`.
pub const SHIELD_WEIGHT_VOLUME: f64 = 0.30;
pub const SHIELD_WEIGHT_PATTERN: f64 = 0.25;
pub const SHIELD_WEIGHT_REPUTATION: f64 = 0.20;
pub const SHIELD_WEIGHT_RESOURCE: f64 = 0.15;
pub const SHIELD_WEIGHT_GEO: f64 = 0.10;

/// Score bucket thresholds.
pub const SHIELD_THRESHOLD_LOW: f64 = 20.0;
pub const SHIELD_THRESHOLD_MEDIUM: f64 = 40.0;
pub const SHIELD_THRESHOLD_HIGH: f64 = 60.0;
pub const SHIELD_THRESHOLD_CRITICAL: f64 = 80.0;

pub const SHIELD_DELAY_MAX_SECS: u64 = 10;
pub const SHIELD_BLOCK_SECS: i64 = 30 * 60;
pub const SHIELD_EMERGENCY_BLOCK_SECS: i64 = 60 * 60;

/// Defense level decay interval (no incidents for this long drops the level).
pub const SHIELD_DECAY_INTERVAL_SECS: i64 = 5 * 60;

// ── Address / denom validation ───────────────────────────────────────────────

pub const EVM_ADDRESS_HEX_LEN: usize = 40;
pub const DENOM_MIN_LEN: usize = 3;
pub const DENOM_MAX_LEN: usize = 16;

// ── Hash sizes ────────────────────────────────────────────────────────────────

pub const HASH_LEN: usize = 32;
pub const PREIMAGE_LEN: usize = 32;
