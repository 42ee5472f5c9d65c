use std::collections::HashMap;
use std::sync::RwLock;

use relay_core::types::{Chain, ChainId, ChainKind, IbcChannel};
use tokio::sync::broadcast;

const TOPOLOGY_CHANNEL_CAPACITY: usize = 256;

/// Emitted on `subscribe()` whenever the registry's chain or channel set
/// changes, so long-lived planners can invalidate cached routes.
#[derive(Clone, Debug)]
pub enum TopologyChange {
    ChainRegistered(ChainId),
    ChainRemoved(ChainId),
    ChannelRegistered { source: ChainId, dest: ChainId, channel_id: String },
}

#[derive(Default, Clone, Copy)]
pub struct ChainFilter {
    pub kind: Option<ChainKind>,
}

/// In-memory topology of chains and IBC channels (C3). Registration is
/// expected to happen at startup from config and occasionally via an admin
/// operation; lookups happen on every route computation, so reads take a
/// shared lock and writes a short-lived exclusive one.
pub struct ChainRegistry {
    chains: RwLock<HashMap<ChainId, Chain>>,
    channels: RwLock<HashMap<ChainId, Vec<IbcChannel>>>,
    topology_tx: broadcast::Sender<TopologyChange>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        let (topology_tx, _) = broadcast::channel(TOPOLOGY_CHANNEL_CAPACITY);
        Self {
            chains: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            topology_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TopologyChange> {
        self.topology_tx.subscribe()
    }

    pub fn register_chain(&self, chain: Chain) {
        let id = chain.id.clone();
        self.chains.write().unwrap().insert(id.clone(), chain);
        let _ = self.topology_tx.send(TopologyChange::ChainRegistered(id));
    }

    pub fn remove_chain(&self, id: &ChainId) {
        self.chains.write().unwrap().remove(id);
        self.channels.write().unwrap().remove(id);
        let _ = self.topology_tx.send(TopologyChange::ChainRemoved(id.clone()));
    }

    pub fn register_channel(&self, channel: IbcChannel) {
        let source = channel.source_chain.clone();
        let dest = channel.dest_chain.clone();
        let channel_id = channel.channel_id.clone();
        self.channels
            .write()
            .unwrap()
            .entry(source.clone())
            .or_default()
            .push(channel);
        let _ = self.topology_tx.send(TopologyChange::ChannelRegistered {
            source,
            dest,
            channel_id,
        });
    }

    pub fn get_chain(&self, id: &ChainId) -> Option<Chain> {
        self.chains.read().unwrap().get(id).cloned()
    }

    pub fn list_chains(&self, filter: ChainFilter) -> Vec<Chain> {
        self.chains
            .read()
            .unwrap()
            .values()
            .filter(|c| filter.kind.map(|k| k == c.kind).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn get_channels(&self, chain_id: &ChainId) -> Vec<IbcChannel> {
        self.channels.read().unwrap().get(chain_id).cloned().unwrap_or_default()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: &str, kind: ChainKind) -> Chain {
        Chain {
            id: ChainId(id.to_string()),
            kind,
            native_denom: "utest".to_string(),
            addr_prefix: None,
            block_time: 6,
            required_confirmations: 2,
            endpoints: vec![],
        }
    }

    #[test]
    fn registered_chain_is_retrievable() {
        let registry = ChainRegistry::new();
        registry.register_chain(chain("chain-a", ChainKind::Evm));
        assert!(registry.get_chain(&ChainId("chain-a".to_string())).is_some());
    }

    #[test]
    fn filter_by_kind_excludes_other_kinds() {
        let registry = ChainRegistry::new();
        registry.register_chain(chain("chain-a", ChainKind::Evm));
        registry.register_chain(chain("chain-b", ChainKind::Cosmos));
        let cosmos_only = registry.list_chains(ChainFilter { kind: Some(ChainKind::Cosmos) });
        assert_eq!(cosmos_only.len(), 1);
        assert_eq!(cosmos_only[0].id, ChainId("chain-b".to_string()));
    }

    #[test]
    fn channel_registration_is_queryable_by_source() {
        let registry = ChainRegistry::new();
        let channel = IbcChannel {
            source_chain: ChainId("chain-a".to_string()),
            dest_chain: ChainId("chain-b".to_string()),
            port_id: "transfer".to_string(),
            channel_id: "channel-0".to_string(),
            state: relay_core::types::ChannelState::Open,
            ordering: "unordered".to_string(),
            version: "ics20-1".to_string(),
        };
        registry.register_channel(channel);
        let channels = registry.get_channels(&ChainId("chain-a".to_string()));
        assert_eq!(channels.len(), 1);
    }
}
