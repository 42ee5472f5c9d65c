use std::sync::Arc;
use std::time::Duration;

use relay_core::constants::{DEFAULT_HIGH_WATERMARK, DEFAULT_REORG_WINDOW};
use relay_core::error::RelayError;
use relay_core::types::{ChainId, Event};
use relay_store::{MonitorCursor, SwapStore};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::reorg::{Observation, ReorgWindow};
use crate::source::ChainSource;

pub struct MonitorConfig {
    pub reorg_window: u64,
    pub high_watermark: usize,
    pub poll_interval: Duration,
    pub stall_after_consecutive_errors: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reorg_window: DEFAULT_REORG_WINDOW,
            high_watermark: DEFAULT_HIGH_WATERMARK,
            poll_interval: Duration::from_millis(200),
            stall_after_consecutive_errors: 3,
        }
    }
}

/// A single item in a chain's totally-ordered stream: either a new event or
/// a directive to rewind to an earlier height after a reorg.
#[derive(Debug)]
pub enum StreamItem {
    Event(Event),
    Rewind(u64),
}

/// Produces the ordered, de-duplicated event stream for one chain (C2).
/// `run` drives the loop; events are sent on a bounded channel so the
/// monitor naturally pauses pulling new blocks once the channel is full —
/// the backpressure contract is the channel's own capacity.
pub struct ChainMonitor {
    chain_id: ChainId,
    source: Arc<dyn ChainSource>,
    store: Arc<SwapStore>,
    config: MonitorConfig,
    window: ReorgWindow,
}

impl ChainMonitor {
    pub fn new(
        chain_id: ChainId,
        source: Arc<dyn ChainSource>,
        store: Arc<SwapStore>,
        config: MonitorConfig,
    ) -> Self {
        let window = ReorgWindow::new(config.reorg_window);
        Self {
            chain_id,
            source,
            store,
            config,
            window,
        }
    }

    /// Channel sized at `high_watermark`; a full channel is the monitor's
    /// backpressure signal to stop pulling new blocks.
    pub fn channel(&self) -> (mpsc::Sender<StreamItem>, mpsc::Receiver<StreamItem>) {
        mpsc::channel(self.config.high_watermark.max(1))
    }

    fn resume_height(&self) -> Result<u64, RelayError> {
        Ok(match self.store.get_monitor_cursor(&self.chain_id)? {
            Some(cursor) => cursor.resume_height(self.config.reorg_window),
            None => 0,
        })
    }

    /// Runs until cancelled or until persistent upstream errors raise
    /// `MonitorStalled`. A transient error retries via the caller's
    /// connection pool (not modeled here); three consecutive failures are
    /// treated as persistent.
    pub async fn run(
        mut self,
        tx: mpsc::Sender<StreamItem>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<(), RelayError> {
        let mut height = self.resume_height()?;
        let mut consecutive_errors = 0u32;

        loop {
            if cancel.try_recv().is_ok() {
                return Ok(());
            }

            let head = match self.source.current_height(&self.chain_id).await {
                Ok(h) => {
                    consecutive_errors = 0;
                    h
                }
                Err(_) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.stall_after_consecutive_errors {
                        warn!(chain_id = %self.chain_id, "event monitor stalled");
                        return Err(RelayError::MonitorStalled(self.chain_id.0.clone()));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                    continue;
                }
            };

            if height > head {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            let hash = self.source.block_hash(&self.chain_id, height).await?;
            match self.window.observe(height, hash) {
                Observation::Continue => {
                    let events = self.source.fetch_events(&self.chain_id, height).await?;
                    for event in events {
                        if tx.send(StreamItem::Event(event)).await.is_err() {
                            return Ok(());
                        }
                    }
                    self.store.put_monitor_cursor(&MonitorCursor {
                        chain_id: self.chain_id.clone(),
                        height,
                        tx_index: 0,
                        log_index: 0,
                        version: 0,
                    })?;
                    height += 1;
                }
                Observation::Rewind(to_height) => {
                    if tx.send(StreamItem::Rewind(to_height)).await.is_err() {
                        return Ok(());
                    }
                    height = to_height;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedSource {
        head: AtomicU64,
    }

    impl ChainSource for FixedSource {
        fn current_height(&self, _chain_id: &ChainId) -> crate::source::MonitorFuture<u64> {
            let head = self.head.load(Ordering::SeqCst);
            Box::pin(async move { Ok(head) })
        }

        fn block_hash(&self, _chain_id: &ChainId, height: u64) -> crate::source::MonitorFuture<[u8; 32]> {
            let mut hash = [0u8; 32];
            hash[..8].copy_from_slice(&height.to_le_bytes());
            Box::pin(async move { Ok(hash) })
        }

        fn fetch_events(&self, chain_id: &ChainId, height: u64) -> crate::source::MonitorFuture<Vec<Event>> {
            let chain_id = chain_id.clone();
            Box::pin(async move {
                Ok(vec![Event {
                    chain_id,
                    kind: relay_core::types::EventKind::HtlcCreated,
                    block_height: height,
                    tx_index: 0,
                    log_index: 0,
                    tx_hash: format!("0x{height}"),
                    payload: serde_json::Value::Null,
                }])
            })
        }
    }

    fn temp_store() -> Arc<SwapStore> {
        let mut p = std::env::temp_dir();
        p.push(format!("relay-monitor-test-{}", rand::random::<u64>()));
        Arc::new(SwapStore::open(p).unwrap())
    }

    #[tokio::test]
    async fn emits_one_event_per_block_up_to_head() {
        let chain_id = ChainId("evm-1".into());
        let source = Arc::new(FixedSource {
            head: AtomicU64::new(2),
        });
        let store = temp_store();
        let monitor = ChainMonitor::new(chain_id.clone(), source, store, MonitorConfig::default());
        let (tx, mut rx) = monitor.channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let handle = tokio::spawn(monitor.run(tx, cancel_rx));

        let mut seen_heights = Vec::new();
        for _ in 0..3 {
            match rx.recv().await {
                Some(StreamItem::Event(e)) => seen_heights.push(e.block_height),
                _ => break,
            }
        }
        let _ = cancel_tx.send(());
        let _ = handle.await;

        assert_eq!(seen_heights, vec![0, 1, 2]);
    }
}
