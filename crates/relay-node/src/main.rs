//! relay-node — the swap relayer's binary.
//!
//! Startup sequence:
//!   1. Open the swap store
//!   2. Load the chain/channel topology from `RelayConfig`
//!   3. Build a connection pool + HTLC adapter per chain
//!   4. Build the route planner, coordinator, recovery sweeper and shield
//!   5. Spawn one event monitor per chain, piping events into the coordinator
//!   6. Serve the control API until interrupted

mod config;
mod rpc_adapter;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use relay_api::{AppState, ApiServer};
use relay_core::types::{ChainId, Event, SwapId};
use relay_coordinator::{CoordinatorConfig, SwapCoordinator};
use relay_htlc::{AdapterKind, ChainAdapter, CosmosHtlcAdapter, EvmHtlcAdapter};
use relay_monitor::{ChainMonitor, MonitorConfig, StreamItem};
use relay_observability::Context as ObsContext;
use relay_pool::{ConnectionPool, PoolConfig};
use relay_recovery::{RecoveryConfig, RecoverySweeper};
use relay_route::{ChainRegistry, GraphRoutePlanner, RoutePlannerConfig};
use relay_shield::{DdosShield, GeoLayer, ReputationClass, ReputationLayer, StaticGeoSource, StaticReputationSource};
use relay_store::SwapStore;

use crate::config::RelayConfig;
use crate::rpc_adapter::{RpcAdapter, RpcChainSource, RpcProber};

#[derive(Parser, Debug)]
#[command(name = "relay-node", version, about = "Cross-chain atomic-swap relayer")]
struct Args {
    /// Directory for the persistent swap store.
    #[arg(long, default_value = "~/.relay/data")]
    data_dir: PathBuf,

    /// Path to the chain/channel topology config (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Control API listen address; overrides `api_listen` in the config file.
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Log filter, `tracing_subscriber::EnvFilter` syntax.
    #[arg(long, default_value = "info,relay=debug")]
    log_filter: String,
}

/// The htlc id carried on every `CreateHtlcRequest`/event payload is either
/// the bare swap id (source lock, source withdraw, refund) or
/// `{swapId}-hop{n}` (hop sends and secret propagation); strip the suffix
/// to recover the swap id an observed event belongs to.
fn swap_id_from_event(event: &Event) -> Option<SwapId> {
    let htlc_id = event.payload.get("htlc_id")?.as_str()?;
    let base = htlc_id.split("-hop").next().unwrap_or(htlc_id);
    SwapId::from_hex(base).ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let ctx = ObsContext::init(&args.log_filter);
    info!("relay node starting");

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let config = RelayConfig::load(&args.config)
        .with_context(|| format!("loading relay config from {}", args.config.display()))?;

    let api_addr = args
        .api_addr
        .or(config.api_listen)
        .unwrap_or_else(|| "127.0.0.1:8088".parse().unwrap());

    let store = Arc::new(SwapStore::open(&data_dir).context("opening swap store")?);

    let registry = Arc::new(ChainRegistry::new());
    for entry in &config.chains {
        registry.register_chain(entry.into());
    }
    for entry in &config.channels {
        registry.register_channel(entry.into());
    }

    let http_client = reqwest::Client::new();
    let monitors_healthy = Arc::new(AtomicBool::new(true));

    let mut pools: Vec<Arc<ConnectionPool>> = Vec::new();
    let mut adapters: HashMap<ChainId, Arc<ChainAdapter>> = HashMap::new();

    for entry in &config.chains {
        let chain_id = ChainId(entry.id.clone());
        let prober = Arc::new(RpcProber::new(http_client.clone()));
        let pool = Arc::new(ConnectionPool::new(
            chain_id.clone(),
            entry.endpoints.clone(),
            PoolConfig::default(),
            prober,
        ));
        pools.push(pool.clone());

        let pool_for_health = pool.clone();
        tokio::spawn(async move {
            pool_for_health.run_health_checks().await;
        });

        let rpc = Arc::new(RpcAdapter::new(pool.clone(), http_client.clone()));
        let chain: relay_core::types::Chain = entry.into();
        let kind: AdapterKind = chain.kind.into();
        let adapter = match kind {
            AdapterKind::Evm => ChainAdapter::Evm(EvmHtlcAdapter {
                submitter: rpc.clone(),
                querier: rpc.clone(),
            }),
            AdapterKind::Cosmos => ChainAdapter::Cosmos(CosmosHtlcAdapter {
                submitter: rpc.clone(),
                querier: rpc.clone(),
            }),
        };
        adapters.insert(chain_id, Arc::new(adapter));
    }

    let route_planner = Arc::new(GraphRoutePlanner::new(registry.clone(), RoutePlannerConfig::default()));
    let coordinator = Arc::new(SwapCoordinator::new(
        store.clone(),
        adapters,
        route_planner,
        CoordinatorConfig::default(),
    ));

    let reputation_source = StaticReputationSource::new();
    for ip in &config.shield.trusted_ips {
        reputation_source.set(ip, ReputationClass::Good);
    }
    for ip in &config.shield.blocked_ips {
        reputation_source.set(ip, ReputationClass::Malicious);
    }
    let shield = Arc::new(DdosShield::new(
        ReputationLayer::new(Box::new(reputation_source)),
        GeoLayer::new(Box::new(StaticGeoSource::new(0.0))),
        config.shield.resource_threshold,
        chrono::Utc::now().timestamp(),
    ));

    let sweeper = RecoverySweeper::new(store.clone(), coordinator.clone(), RecoveryConfig::default());
    let (sweeper_cancel_tx, sweeper_cancel_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(err) = sweeper.run(sweeper_cancel_rx).await {
            error!(error = %err, "recovery sweeper exited");
        }
    });

    let mut monitor_cancels = Vec::new();
    for entry in &config.chains {
        let chain_id = ChainId(entry.id.clone());
        let pool = pools
            .iter()
            .find(|p| p.chain_id() == &chain_id)
            .cloned()
            .expect("pool registered above for every configured chain");
        let source = Arc::new(RpcChainSource::new(pool, http_client.clone()));
        let monitor = ChainMonitor::new(chain_id.clone(), source, store.clone(), MonitorConfig::default());
        let (tx, mut rx) = monitor.channel();
        let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel();
        monitor_cancels.push(cancel_tx);

        let healthy_for_monitor = monitors_healthy.clone();
        let monitor_chain_id = chain_id.clone();
        tokio::spawn(async move {
            if let Err(err) = monitor.run(tx, cancel_rx).await {
                warn!(chain_id = %monitor_chain_id, error = %err, "event monitor exited");
                healthy_for_monitor.store(false, Ordering::Relaxed);
            }
        });

        let coordinator_for_drain = coordinator.clone();
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                if let StreamItem::Event(event) = item {
                    let Some(id) = swap_id_from_event(&event) else {
                        continue;
                    };
                    if let Err(err) = coordinator_for_drain.apply_event(&id, &event) {
                        warn!(error = %err, "failed to apply observed event");
                    }
                }
            }
        });
    }

    let state = AppState {
        store,
        coordinator,
        registry,
        shield,
        metrics: ctx.metrics.clone(),
        pools: Arc::new(pools),
        monitors_healthy,
    };
    let server = ApiServer::new(state);

    info!(%api_addr, "relay node ready");
    tokio::select! {
        result = server.serve(api_addr) => {
            result.context("control API server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");
            for cancel in monitor_cancels {
                let _ = cancel.send(());
            }
            let _ = sweeper_cancel_tx.send(());
            std::process::exit(130);
        }
    }

    Ok(())
}

fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
