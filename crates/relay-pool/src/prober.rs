use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use relay_core::error::RelayError;

pub type ProbeFuture = Pin<Box<dyn Future<Output = Result<Duration, RelayError>> + Send>>;

/// A lightweight per-protocol liveness check (e.g. `getHeight`). The pool
/// never speaks chain-specific RPC itself — probing is supplied by the
/// caller (HTLC adapters, event monitors) so this crate stays chain-agnostic.
pub trait Prober: Send + Sync {
    fn probe(&self, endpoint: &str) -> ProbeFuture;
}

/// A `Prober` built from a plain async closure, for tests and simple wiring.
pub struct FnProber<F>(pub F);

impl<F, Fut> Prober for FnProber<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Duration, RelayError>> + Send + 'static,
{
    fn probe(&self, endpoint: &str) -> ProbeFuture {
        Box::pin((self.0)(endpoint.to_string()))
    }
}
