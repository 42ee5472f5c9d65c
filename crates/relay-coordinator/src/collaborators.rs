use relay_core::error::RelayError;
use relay_core::types::{ChainId, Hop, Timelock};

/// Route planning (C3) as an opaque collaborator, per the capability-set
/// design used throughout: the coordinator consumes a trait, not a concrete
/// planner, so it compiles independently of the route-planning implementation.
pub trait RoutePlanner: Send + Sync {
    fn plan_route(
        &self,
        source: &ChainId,
        destination: &ChainId,
        timelock: &Timelock,
    ) -> Result<Vec<Hop>, RelayError>;
}
