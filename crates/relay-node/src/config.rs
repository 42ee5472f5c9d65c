//! `RelayConfig`: the on-disk description of a deployment's chain topology
//! and tunables. Loading a layered/merged config is explicitly out of
//! scope — this is a single JSON file read once at startup.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use relay_core::types::{Chain, ChainId, ChainKind, ChannelState, IbcChannel};

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct ChainEntry {
    pub id: String,
    pub kind: ChainKindDto,
    pub native_denom: String,
    pub addr_prefix: Option<String>,
    pub block_time: i64,
    pub required_confirmations: u64,
    pub endpoints: Vec<String>,
}

#[derive(Clone, Copy, Deserialize, Serialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ChainKindDto {
    Evm,
    Cosmos,
}

impl From<ChainKindDto> for ChainKind {
    fn from(kind: ChainKindDto) -> Self {
        match kind {
            ChainKindDto::Evm => ChainKind::Evm,
            ChainKindDto::Cosmos => ChainKind::Cosmos,
        }
    }
}

impl From<&ChainEntry> for Chain {
    fn from(entry: &ChainEntry) -> Self {
        Chain {
            id: ChainId(entry.id.clone()),
            kind: entry.kind.into(),
            native_denom: entry.native_denom.clone(),
            addr_prefix: entry.addr_prefix.clone(),
            block_time: entry.block_time,
            required_confirmations: entry.required_confirmations,
            endpoints: entry.endpoints.clone(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct ChannelEntry {
    pub source_chain: String,
    pub dest_chain: String,
    pub port_id: String,
    pub channel_id: String,
    pub ordering: String,
    pub version: String,
}

impl From<&ChannelEntry> for IbcChannel {
    fn from(entry: &ChannelEntry) -> Self {
        IbcChannel {
            source_chain: ChainId(entry.source_chain.clone()),
            dest_chain: ChainId(entry.dest_chain.clone()),
            port_id: entry.port_id.clone(),
            channel_id: entry.channel_id.clone(),
            state: ChannelState::Open,
            ordering: entry.ordering.clone(),
            version: entry.version.clone(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize, Debug)]
pub struct ShieldEntry {
    /// Static IP -> reputation class overrides, e.g. known partner relayers.
    #[serde(default)]
    pub trusted_ips: Vec<String>,
    #[serde(default)]
    pub blocked_ips: Vec<String>,
    #[serde(default = "default_resource_threshold")]
    pub resource_threshold: f64,
}

fn default_resource_threshold() -> f64 {
    0.85
}

impl Default for ShieldEntry {
    fn default() -> Self {
        Self {
            trusted_ips: Vec::new(),
            blocked_ips: Vec::new(),
            resource_threshold: default_resource_threshold(),
        }
    }
}

/// Deployment-wide configuration: chain topology, IBC channels, and the
/// shield's static reputation seed. Pool/recovery/route tunables are left
/// at their crate defaults unless a future revision of this file adds them.
#[derive(Clone, Deserialize, Serialize, Debug, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub chains: Vec<ChainEntry>,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
    #[serde(default)]
    pub shield: ShieldEntry,
    pub api_listen: Option<SocketAddr>,
}

impl RelayConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading relay config from {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing relay config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let json = r#"{
            "chains": [
                {"id": "evm-1", "kind": "evm", "native_denom": "wei", "addr_prefix": null,
                 "block_time": 12, "required_confirmations": 6, "endpoints": ["http://a"]}
            ],
            "channels": [],
            "shield": {"trusted_ips": [], "blocked_ips": [], "resource_threshold": 0.9},
            "api_listen": "127.0.0.1:8080"
        }"#;
        let cfg: RelayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.chains.len(), 1);
        let chain: Chain = (&cfg.chains[0]).into();
        assert_eq!(chain.id, ChainId("evm-1".into()));
    }

    #[test]
    fn missing_shield_block_falls_back_to_defaults() {
        let json = r#"{"chains": [], "channels": []}"#;
        let cfg: RelayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.shield.resource_threshold, 0.85);
    }
}
