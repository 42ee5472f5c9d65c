//! relay-pool
//!
//! Per-chain connection pooling: health checks, circuit breakers and
//! latency-biased round-robin selection over RPC/WS/REST endpoints (C1).
//!
//! Actual chain RPC is treated as an opaque capability supplied by the
//! caller (`Prober`, and the client closure passed to `with_client`); this
//! crate never speaks a chain's wire protocol itself.

pub mod circuit;
pub mod config;
pub mod member;
pub mod pool;
pub mod prober;

pub use circuit::CircuitBreaker;
pub use config::PoolConfig;
pub use pool::{ConnectionPool, Lease};
pub use prober::{FnProber, ProbeFuture, Prober};
