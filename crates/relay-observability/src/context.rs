use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::metrics::Metrics;

/// Bundles the process-wide `Metrics` registry with the initialized
/// `tracing` dispatcher.
///
/// Built once at `relay-node` startup and passed down by reference
/// (`Arc<Context>`) to every component that needs to record a metric —
/// this is the explicit-dependency-passing replacement for a lazily
/// initialized global singleton: nothing in this workspace reaches for a
/// `static` to get at `Metrics`.
pub struct Context {
    pub metrics: Arc<Metrics>,
}

impl Context {
    /// Initializes the `tracing` subscriber from `RUST_LOG`, falling back to
    /// `default_filter`, and returns a fresh `Context` wrapping a new
    /// `Metrics` registry. Must be called at most once per process.
    pub fn init(default_filter: &str) -> Self {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.parse().unwrap()),
            )
            .init();

        Self {
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Builds a `Context` around an existing `Metrics` registry without
    /// touching the global tracing dispatcher. Used by tests and by any
    /// binary that wants its own filter setup ahead of this call.
    pub fn with_metrics(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_metrics_wraps_the_given_registry() {
        let metrics = Arc::new(Metrics::new());
        metrics.inc_swaps_created();
        let ctx = Context::with_metrics(metrics.clone());
        assert_eq!(
            ctx.metrics.swaps_created_total.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }
}
