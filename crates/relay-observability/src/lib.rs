pub mod context;
pub mod metrics;

pub use context::Context;
pub use metrics::Metrics;
