pub mod monitor;
pub mod reorg;
pub mod source;

pub use monitor::{ChainMonitor, MonitorConfig, StreamItem};
pub use reorg::{Observation, ReorgWindow};
pub use source::{ChainSource, MonitorFuture};
