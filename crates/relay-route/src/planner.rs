use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

use relay_core::constants::{
    DEFAULT_MAX_HOPS, DEFAULT_MIN_DEST_TIMELOCK_SECS, DEFAULT_MIN_HOP_BUFFER_SECS, ROUTE_COST_ALPHA,
    ROUTE_COST_BETA, ROUTE_COST_GAMMA,
};
use relay_core::error::RelayError;
use relay_core::types::{ChainId, ChannelState, Hop, Timelock};
use relay_coordinator::RoutePlanner;

use crate::registry::{ChainFilter, ChainRegistry};

pub struct RoutePlannerConfig {
    pub max_hops: usize,
    pub min_hop_buffer_secs: i64,
    pub min_dest_timelock_secs: i64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for RoutePlannerConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            min_hop_buffer_secs: DEFAULT_MIN_HOP_BUFFER_SECS,
            min_dest_timelock_secs: DEFAULT_MIN_DEST_TIMELOCK_SECS,
            alpha: ROUTE_COST_ALPHA,
            beta: ROUTE_COST_BETA,
            gamma: ROUTE_COST_GAMMA,
        }
    }
}

#[derive(Clone)]
struct Candidate {
    chain: ChainId,
    cost: f64,
    hops: Vec<Hop>,
}

/// Tie-break per the design notes: lower cost, then shorter route, then
/// lexicographically lower hop-id sequence. `BinaryHeap` is a max-heap so
/// this `Ord` is reversed at the call site via `Reverse`.
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .partial_cmp(&other.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.hops.len().cmp(&other.hops.len()))
            .then_with(|| hop_ids(&self.hops).cmp(&hop_ids(&other.hops)))
    }
}

fn hop_ids(hops: &[Hop]) -> String {
    hops.iter().map(|h| h.channel_id.clone()).collect::<Vec<_>>().join(",")
}

/// Bounded-cost best-first search over the chain/channel topology (C3).
pub struct GraphRoutePlanner {
    registry: Arc<ChainRegistry>,
    config: RoutePlannerConfig,
}

impl GraphRoutePlanner {
    pub fn new(registry: Arc<ChainRegistry>, config: RoutePlannerConfig) -> Self {
        Self { registry, config }
    }

    /// Up to `k` routes from `source` to `destination`, cheapest first, each
    /// satisfying `max_hops`/no-cycle/open-channel constraints. Does not
    /// check timelock feasibility — that's `plan_route`'s job, since it
    /// requires the swap's requested timelock.
    pub fn find_routes(&self, source: &ChainId, destination: &ChainId, k: usize) -> Vec<Vec<Hop>> {
        use std::cmp::Reverse;

        let mut heap = BinaryHeap::new();
        heap.push(Reverse(Candidate {
            chain: source.clone(),
            cost: 0.0,
            hops: Vec::new(),
        }));

        let mut results = Vec::new();
        while let Some(Reverse(candidate)) = heap.pop() {
            if &candidate.chain == destination && !candidate.hops.is_empty() {
                results.push(candidate.hops.clone());
                if results.len() >= k {
                    break;
                }
                continue;
            }
            if candidate.hops.len() >= self.config.max_hops {
                continue;
            }

            let visited: HashSet<&ChainId> = candidate.hops.iter().map(|h| &h.from_chain).collect();
            for channel in self.registry.get_channels(&candidate.chain) {
                if channel.state != ChannelState::Open {
                    continue;
                }
                if visited.contains(&channel.dest_chain) || channel.dest_chain == *source {
                    continue;
                }
                let Some(dest_chain) = self.registry.get_chain(&channel.dest_chain) else {
                    continue;
                };

                let est_relay_time = (dest_chain.required_confirmations as f64) * (dest_chain.block_time as f64);
                let fee = 0.0;
                let risk = 0.0;
                let hop_cost = self.config.alpha * est_relay_time + self.config.beta * fee + self.config.gamma * risk;

                let mut hops = candidate.hops.clone();
                hops.push(Hop {
                    from_chain: candidate.chain.clone(),
                    to_chain: channel.dest_chain.clone(),
                    channel_id: channel.channel_id.clone(),
                    timeout_height: 0,
                    timeout_timestamp: 0,
                    expected_timelock: 0,
                });

                heap.push(Reverse(Candidate {
                    chain: channel.dest_chain.clone(),
                    cost: candidate.cost + hop_cost,
                    hops,
                }));
            }
        }

        results
    }

    /// Assigns a timelock cascade to a hop sequence: `T_i = T_{i-1} - delta_i`
    /// where `delta_i >= max(2*requiredConfirmations*blockTime, minHopBuffer)`.
    /// Returns `None` if the final hop's timelock would fall below
    /// `min_dest_timelock_secs`.
    fn apply_timelock_cascade(&self, hops: &mut [Hop], t0: i64) -> Option<()> {
        let mut prev = t0;
        for hop in hops.iter_mut() {
            let dest = self.registry.get_chain(&hop.to_chain)?;
            let delta = (2 * dest.required_confirmations as i64 * dest.block_time).max(self.config.min_hop_buffer_secs);
            let t_i = prev - delta;
            hop.expected_timelock = t_i;
            prev = t_i;
        }
        if prev < self.config.min_dest_timelock_secs {
            return None;
        }
        Some(())
    }
}

impl RoutePlanner for GraphRoutePlanner {
    fn plan_route(&self, source: &ChainId, destination: &ChainId, timelock: &Timelock) -> Result<Vec<Hop>, RelayError> {
        if source == destination {
            return Err(RelayError::SameChain);
        }
        let t0 = timelock.expiry_time();
        for mut hops in self.find_routes(source, destination, self.config.max_hops) {
            if self.apply_timelock_cascade(&mut hops, t0).is_some() {
                return Ok(hops);
            }
        }
        Err(RelayError::NoFeasibleRoute {
            source: source.to_string(),
            destination: destination.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::{Chain, ChainKind, IbcChannel};

    fn chain(id: &str, block_time: i64, confirmations: u64) -> Chain {
        Chain {
            id: ChainId(id.to_string()),
            kind: ChainKind::Cosmos,
            native_denom: "utest".to_string(),
            addr_prefix: Some("test".to_string()),
            block_time,
            required_confirmations: confirmations,
            endpoints: vec![],
        }
    }

    fn channel(source: &str, dest: &str, channel_id: &str) -> IbcChannel {
        IbcChannel {
            source_chain: ChainId(source.to_string()),
            dest_chain: ChainId(dest.to_string()),
            port_id: "transfer".to_string(),
            channel_id: channel_id.to_string(),
            state: ChannelState::Open,
            ordering: "unordered".to_string(),
            version: "ics20-1".to_string(),
        }
    }

    fn two_hop_registry() -> Arc<ChainRegistry> {
        let registry = Arc::new(ChainRegistry::new());
        registry.register_chain(chain("a", 5, 2));
        registry.register_chain(chain("b", 5, 2));
        registry.register_chain(chain("c", 5, 2));
        registry.register_channel(channel("a", "b", "channel-0"));
        registry.register_channel(channel("b", "c", "channel-1"));
        registry
    }

    #[test]
    fn finds_direct_and_multi_hop_routes() {
        let registry = two_hop_registry();
        let planner = GraphRoutePlanner::new(registry, RoutePlannerConfig::default());
        let routes = planner.find_routes(&ChainId("a".to_string()), &ChainId("c".to_string()), 3);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 2);
    }

    #[test]
    fn plan_route_assigns_decreasing_timelocks() {
        let registry = two_hop_registry();
        let planner = GraphRoutePlanner::new(registry, RoutePlannerConfig::default());
        let timelock = Timelock::new(0, 100_000, 0);
        let hops = planner
            .plan_route(&ChainId("a".to_string()), &ChainId("c".to_string()), &timelock)
            .unwrap();
        assert_eq!(hops.len(), 2);
        assert!(hops[0].expected_timelock > hops[1].expected_timelock);
    }

    #[test]
    fn infeasible_timelock_yields_no_feasible_route() {
        let registry = two_hop_registry();
        let planner = GraphRoutePlanner::new(registry, RoutePlannerConfig::default());
        let timelock = Timelock::new(0, 10, 0);
        let err = planner
            .plan_route(&ChainId("a".to_string()), &ChainId("c".to_string()), &timelock)
            .unwrap_err();
        assert!(matches!(err, RelayError::NoFeasibleRoute { .. }));
    }

    #[test]
    fn closed_channel_is_excluded_from_routes() {
        let registry = Arc::new(ChainRegistry::new());
        registry.register_chain(chain("a", 5, 2));
        registry.register_chain(chain("b", 5, 2));
        let mut closed = channel("a", "b", "channel-0");
        closed.state = ChannelState::Closed;
        registry.register_channel(closed);
        let planner = GraphRoutePlanner::new(registry, RoutePlannerConfig::default());
        let routes = planner.find_routes(&ChainId("a".to_string()), &ChainId("b".to_string()), 1);
        assert!(routes.is_empty());
    }
}
