//! relay-api
//!
//! REST control surface for the relayer (C10): swap intake and inspection,
//! admin actions, health and metrics. Gated by `relay-shield`'s DDoS shield
//! on every route except `/health` and `/metrics`.
//!
//! Endpoints:
//!   POST /swaps                     — create a swap
//!   GET  /swaps/{id}                — fetch a swap document
//!   POST /admin/emergency-stop      — halt new transitions and reject traffic
//!   POST /admin/blacklist/{ip}      — manually ban an IP
//!   GET  /health                    — 200 iff monitors and primary pools are healthy
//!   GET  /metrics                   — Prometheus text format

pub mod error;
pub mod handlers;
pub mod server;
pub mod shield_mw;
pub mod types;

pub use error::ApiError;
pub use server::{AppState, ApiServer};
