use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use relay_core::constants::{DEFAULT_RECOVERY_IMMINENT_WINDOW_SECS, DEFAULT_RECOVERY_SWEEP_INTERVAL_SECS};
use relay_core::error::RelayError;
use relay_core::types::SwapStatus;
use relay_coordinator::SwapCoordinator;
use relay_store::{Pagination, SwapFilter, SwapStore};
use tokio::sync::oneshot;
use tracing::{info, warn};

pub struct RecoveryConfig {
    pub sweep_interval: Duration,
    /// A swap whose deadline falls within this many seconds is treated as
    /// imminent and swept even before it has technically expired, so a
    /// worker gets a chance to drive it into `Refunding` before the
    /// on-chain timelock itself lapses.
    pub imminent_window_secs: i64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_RECOVERY_SWEEP_INTERVAL_SECS as u64),
            imminent_window_secs: DEFAULT_RECOVERY_IMMINENT_WINDOW_SECS,
        }
    }
}

fn non_terminal_statuses() -> Vec<SwapStatus> {
    vec![
        SwapStatus::Pending,
        SwapStatus::SourceLocked,
        SwapStatus::RouteComputed,
        SwapStatus::HopsInFlight(0),
        SwapStatus::DestLocked,
        SwapStatus::DestWithdrawn,
        SwapStatus::SecretPropagating(0),
        SwapStatus::SourceWithdrawn,
        SwapStatus::Refunding,
    ]
}

/// Periodic sweep over the swap store (C7): any swap isn't otherwise driven
/// forward unless a chain event or the coordinator's own tick calls
/// `drive()`. If the monitor feeding it stalls, a swap whose deadline has
/// already passed or is approaching would sit forever. The sweep re-drives
/// it so the coordinator's own deadline check moves it to `Refunding`.
pub struct RecoverySweeper {
    store: Arc<SwapStore>,
    coordinator: Arc<SwapCoordinator>,
    config: RecoveryConfig,
}

impl RecoverySweeper {
    pub fn new(store: Arc<SwapStore>, coordinator: Arc<SwapCoordinator>, config: RecoveryConfig) -> Self {
        Self {
            store,
            coordinator,
            config,
        }
    }

    pub async fn run(self, mut cancel: oneshot::Receiver<()>) -> Result<(), RelayError> {
        loop {
            if cancel.try_recv().is_ok() {
                return Ok(());
            }

            let swept = self.sweep_once().await?;
            if swept > 0 {
                info!(swept, "recovery sweep drove stale swaps forward");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.sweep_interval) => {}
                _ = &mut cancel => return Ok(()),
            }
        }
    }

    /// One pass over non-terminal swaps; returns the count re-driven. The
    /// status discriminant used for filtering ignores the carried `u32`, so
    /// the placeholder `0` in `non_terminal_statuses` matches any hop index.
    async fn sweep_once(&self) -> Result<usize, RelayError> {
        let now = Utc::now().timestamp();
        let imminent_cutoff = now + self.config.imminent_window_secs;

        let swaps = self.store.list(
            SwapFilter {
                statuses: Some(non_terminal_statuses()),
            },
            Pagination::default(),
        )?;

        let mut swept = 0;
        for swap in swaps {
            if swap.expires_at() > imminent_cutoff {
                continue;
            }
            match self.coordinator.drive(&swap.id).await {
                Ok(_) => swept += 1,
                Err(RelayError::LeaseContended) => continue,
                Err(err) => warn!(swap_id = %swap.id.to_hex(), error = %err, "recovery sweep failed to drive swap"),
            }
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use relay_coordinator::CoordinatorConfig;
    use relay_core::types::{
        Amount, Address, ChainId, Denom, Hop, Secret, SecretAlgo, Swap, SwapId, SwapParty, Timelock,
    };
    use relay_htlc::{AdapterFuture, ChainAdapter, CosmosHtlcAdapter, EvmHtlcAdapter, HtlcRecord, Querier, TxOutcome, TxSubmitter};

    struct NeverCalledSubmitter;
    impl TxSubmitter for NeverCalledSubmitter {
        fn submit(&self, _chain_id: &ChainId, _payload: Vec<u8>) -> AdapterFuture<TxOutcome> {
            Box::pin(async {
                Ok(TxOutcome {
                    tx_hash: "0xrefund".into(),
                    block_height: 1,
                    confirmations: 1,
                })
            })
        }
        fn nonce_consumed(&self, _chain_id: &ChainId, _nonce_or_seq: &str) -> AdapterFuture<bool> {
            Box::pin(async { Ok(false) })
        }
    }

    struct RefundableQuerier;
    impl Querier for RefundableQuerier {
        fn query_htlc(&self, _chain_id: &ChainId, htlc_id: &str) -> AdapterFuture<Option<HtlcRecord>> {
            let htlc_id = htlc_id.to_string();
            Box::pin(async move {
                Ok(Some(HtlcRecord {
                    htlc_id,
                    hashlock: [1u8; 32],
                    timelock: 0,
                    withdrawn: false,
                    refunded: false,
                }))
            })
        }
        fn current_height(&self, _chain_id: &ChainId) -> AdapterFuture<u64> {
            Box::pin(async { Ok(100) })
        }
    }

    struct UnreachableRoutePlanner;
    impl relay_coordinator::RoutePlanner for UnreachableRoutePlanner {
        fn plan_route(&self, _s: &ChainId, _d: &ChainId, _t: &Timelock) -> Result<Vec<Hop>, RelayError> {
            panic!("expired swaps must refund, never request a fresh route");
        }
    }

    fn temp_store() -> SwapStore {
        let mut dir = std::env::temp_dir();
        dir.push(format!("relay-recovery-test-{:p}", &dir));
        SwapStore::open(&dir).unwrap()
    }

    fn expired_swap() -> Swap {
        Swap {
            id: SwapId([7u8; 16]),
            order_id: None,
            status: SwapStatus::SourceLocked,
            source: SwapParty {
                chain_id: ChainId("evm-1".into()),
                address: Address("0xabc".into()),
                token: Denom("wei".into()),
            },
            destination: SwapParty {
                chain_id: ChainId("osmosis-1".into()),
                address: Address("osmo1xyz".into()),
                token: Denom("uosmo".into()),
            },
            amount: Amount {
                value: 100,
                decimals: 6,
                symbol: "uosmo".into(),
            },
            timelock: Timelock::new(0, 10, 1),
            secret: Secret {
                hash: [1u8; 32],
                preimage: None,
                algo: SecretAlgo::Sha256,
            },
            route: vec![],
            receipts: vec![],
            created_at: 0,
            updated_at: 0,
            version: 0,
        }
    }

    #[tokio::test]
    async fn sweep_drives_expired_swap_into_refunded() {
        let store = Arc::new(temp_store());
        let swap = expired_swap();
        store.create(&swap).unwrap();

        let mut adapters: HashMap<ChainId, Arc<ChainAdapter>> = HashMap::new();
        adapters.insert(
            ChainId("evm-1".into()),
            Arc::new(ChainAdapter::Evm(EvmHtlcAdapter {
                submitter: Arc::new(NeverCalledSubmitter),
                querier: Arc::new(RefundableQuerier),
            })),
        );
        adapters.insert(
            ChainId("osmosis-1".into()),
            Arc::new(ChainAdapter::Cosmos(CosmosHtlcAdapter {
                submitter: Arc::new(NeverCalledSubmitter),
                querier: Arc::new(RefundableQuerier),
            })),
        );

        let coordinator = Arc::new(SwapCoordinator::new(
            store.clone(),
            adapters,
            Arc::new(UnreachableRoutePlanner),
            CoordinatorConfig::default(),
        ));

        let sweeper = RecoverySweeper::new(store.clone(), coordinator, RecoveryConfig::default());
        let swept = sweeper.sweep_once().await.unwrap();
        assert_eq!(swept, 1);

        let reloaded = store.get(&swap.id).unwrap().unwrap();
        assert_eq!(reloaded.status, SwapStatus::Refunded);
    }
}
