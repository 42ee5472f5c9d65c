pub mod planner;
pub mod registry;

pub use planner::{GraphRoutePlanner, RoutePlannerConfig};
pub use registry::{ChainFilter, ChainRegistry, TopologyChange};
