use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use relay_core::constants::{DEFAULT_LEASE_TTL_SECS, DEFAULT_MAX_STEP_RETRIES, DEFAULT_RETRY_BASE_BACKOFF_MS};
use relay_core::error::RelayError;
use relay_core::types::{ChainId, Event, EventKind, Receipt, ReceiptDirection, Swap, SwapStatus, Timestamp};
use relay_htlc::{ChainAdapter, CreateHtlcRequest, HtlcRecord};
use relay_store::{Intent, SwapStore};
use tracing::{info, warn};

use crate::collaborators::RoutePlanner;
use crate::retry::backoff_full_jitter;
use crate::transitions::{next_action, NextAction};

pub struct CoordinatorConfig {
    pub max_step_retries: u32,
    pub retry_base_backoff_ms: u64,
    pub lease_ttl_secs: i64,
    pub retry_backoff_cap_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_step_retries: DEFAULT_MAX_STEP_RETRIES,
            retry_base_backoff_ms: DEFAULT_RETRY_BASE_BACKOFF_MS,
            lease_ttl_secs: DEFAULT_LEASE_TTL_SECS,
            retry_backoff_cap_ms: 60_000,
        }
    }
}

/// Drives each swap through its state machine (C5 — the core). All side
/// effects below are idempotent at the granularity of `(swapId, transition)`:
/// the drive loop records an intent before submitting a chain call and
/// resumes a crashed attempt by polling rather than resubmitting blindly.
pub struct SwapCoordinator {
    store: Arc<SwapStore>,
    adapters: HashMap<ChainId, Arc<ChainAdapter>>,
    route_planner: Arc<dyn RoutePlanner>,
    config: CoordinatorConfig,
    emergency_stopped: AtomicBool,
}

impl SwapCoordinator {
    pub fn new(
        store: Arc<SwapStore>,
        adapters: HashMap<ChainId, Arc<ChainAdapter>>,
        route_planner: Arc<dyn RoutePlanner>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            adapters,
            route_planner,
            config,
            emergency_stopped: AtomicBool::new(false),
        }
    }

    /// `emergencyStop(reason)`: halts new transitions. In-flight chain calls
    /// already past this check run to completion; they are not cancelled.
    pub fn emergency_stop(&self, reason: &str) {
        warn!(reason, "coordinator emergency stop engaged");
        self.emergency_stopped.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.emergency_stopped.store(false, Ordering::SeqCst);
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stopped.load(Ordering::SeqCst)
    }

    /// One tick of the drive loop for a single swap: load under lease,
    /// compute the next action, execute it, commit the resulting status
    /// with `update(id, version+1)`.
    pub async fn drive(&self, id: &relay_core::types::SwapId) -> Result<SwapStatus, RelayError> {
        if self.is_emergency_stopped() {
            return Err(RelayError::EmergencyBlocked);
        }

        let lease = self.store.acquire_lock(id, self.config.lease_ttl_secs)?;
        let swap = self
            .store
            .get(id)?
            .ok_or_else(|| RelayError::HtlcNotFound(id.to_string()))?;

        if swap.status.is_terminal() {
            return Ok(swap.status);
        }

        let now = Utc::now().timestamp();
        let action = next_action(&swap, now);

        let outcome = self.execute(&swap, &action).await;

        let target_status = match outcome {
            Ok(Some(status)) => status,
            Ok(None) => swap.status,
            Err(err) => self.classify_failure(&err)?,
        };

        let updated = self
            .store
            .update(id, swap.version, |s| s.status = target_status)?;

        lease.release();
        info!(swap_id = %id, status = ?updated.status, "drive tick complete");
        Ok(updated.status)
    }

    /// Ingests a totally-ordered C2 event for a swap. Handles the
    /// transitions triggered by externally observed chain state rather than
    /// by the coordinator's own submissions: source lock, hop
    /// acknowledgement, and destination withdrawal.
    pub fn apply_event(&self, id: &relay_core::types::SwapId, event: &Event) -> Result<SwapStatus, RelayError> {
        let lease = self.store.acquire_lock(id, self.config.lease_ttl_secs)?;
        let swap = self
            .store
            .get(id)?
            .ok_or_else(|| RelayError::HtlcNotFound(id.to_string()))?;
        if swap.status.is_terminal() {
            lease.release();
            return Ok(swap.status);
        }
        let updated = self.store.update(id, swap.version, |s| {
            let _ = apply_observed_event(s, event);
        })?;
        lease.release();
        Ok(updated.status)
    }

    async fn execute(&self, swap: &Swap, action: &NextAction) -> Result<Option<SwapStatus>, RelayError> {
        match action {
            NextAction::None => Ok(None),

            NextAction::ComputeRoute => {
                let hops = self
                    .route_planner
                    .plan_route(&swap.source.chain_id, &swap.destination.chain_id, &swap.timelock)?;
                if hops.is_empty() {
                    return Err(RelayError::NoFeasibleRoute {
                        source: swap.source.chain_id.0.clone(),
                        destination: swap.destination.chain_id.0.clone(),
                    });
                }
                Ok(Some(SwapStatus::RouteComputed))
            }

            NextAction::SendHop(i) => {
                let hop = swap
                    .route
                    .get(*i)
                    .ok_or_else(|| RelayError::Other(format!("hop {i} out of range")))?;
                let step = format!("hop-{i}");
                let htlc_id = hop_htlc_id(swap, *i);
                let now = Utc::now().timestamp();

                match self
                    .decide_step(&swap.id, &step, &hop.to_chain, &htlc_id, now, |_record| true)
                    .await?
                {
                    StepDecision::AlreadyLanded => Ok(Some(SwapStatus::HopsInFlight(*i as u32))),
                    StepDecision::Exhausted => {
                        warn!(swap_id = %swap.id, step = %step, "hop send retries exhausted, moving to refunding");
                        Ok(Some(SwapStatus::Refunding))
                    }
                    StepDecision::NotYetDue => Ok(None),
                    StepDecision::Proceed(attempt) => {
                        let adapter = self.adapter_for(&hop.to_chain)?;
                        let req = CreateHtlcRequest {
                            htlc_id: htlc_id.clone(),
                            hashlock: swap.secret.hash,
                            timelock: hop.expected_timelock,
                            recipient: swap.destination.address.0.clone(),
                            amount_value: swap.amount.value,
                            denom: swap.destination.token.0.clone(),
                        };
                        let outcome = adapter
                            .create_htlc(&hop.to_chain, req, |r| {
                                let mut payload = r.htlc_id.as_bytes().to_vec();
                                payload.extend_from_slice(&r.hashlock);
                                payload
                            })
                            .await;
                        match outcome {
                            // Status stays HopsInFlight(i) until the hop's ack is observed.
                            Ok(outcome) => {
                                self.mark_resolved(&swap.id, &step, attempt, outcome.tx_hash)?;
                                Ok(Some(SwapStatus::HopsInFlight(*i as u32)))
                            }
                            Err(err) => {
                                self.schedule_retry(&swap.id, &step, &htlc_id, attempt)?;
                                Err(err)
                            }
                        }
                    }
                }
            }

            NextAction::PropagateSecret(i) => {
                let hop = swap
                    .route
                    .get(*i)
                    .ok_or_else(|| RelayError::Other(format!("hop {i} out of range")))?;
                let step = format!("propagate-{i}");
                let htlc_id = hop_htlc_id(swap, *i);
                let preimage = swap.secret.preimage.ok_or(RelayError::InvalidSecret)?;
                let now = Utc::now().timestamp();

                match self
                    .decide_step(&swap.id, &step, &hop.to_chain, &htlc_id, now, |record| record.withdrawn)
                    .await?
                {
                    StepDecision::AlreadyLanded => Ok(Some(SwapStatus::SecretPropagating(*i as u32))),
                    StepDecision::Exhausted => {
                        warn!(swap_id = %swap.id, step = %step, "secret propagation retries exhausted, moving to refunding");
                        Ok(Some(SwapStatus::Refunding))
                    }
                    StepDecision::NotYetDue => Ok(None),
                    StepDecision::Proceed(attempt) => {
                        let adapter = self.adapter_for(&hop.to_chain)?;
                        match adapter.withdraw(&hop.to_chain, &htlc_id, preimage, swap.secret.algo).await {
                            Ok(outcome) => {
                                self.mark_resolved(&swap.id, &step, attempt, outcome.tx_hash)?;
                                Ok(Some(SwapStatus::SecretPropagating(*i as u32)))
                            }
                            Err(err) => {
                                self.schedule_retry(&swap.id, &step, &htlc_id, attempt)?;
                                Err(err)
                            }
                        }
                    }
                }
            }

            NextAction::SourceWithdraw => {
                let step = "source-withdraw";
                let htlc_id = swap.id.to_hex();
                let preimage = swap.secret.preimage.ok_or(RelayError::InvalidSecret)?;
                let now = Utc::now().timestamp();

                match self
                    .decide_step(&swap.id, step, &swap.source.chain_id, &htlc_id, now, |record| record.withdrawn)
                    .await?
                {
                    StepDecision::AlreadyLanded => Ok(Some(SwapStatus::Completed)),
                    StepDecision::Exhausted => {
                        warn!(swap_id = %swap.id, "source withdraw retries exhausted, moving to refunding");
                        Ok(Some(SwapStatus::Refunding))
                    }
                    StepDecision::NotYetDue => Ok(None),
                    StepDecision::Proceed(attempt) => {
                        let adapter = self.adapter_for(&swap.source.chain_id)?;
                        match adapter
                            .withdraw(&swap.source.chain_id, &htlc_id, preimage, swap.secret.algo)
                            .await
                        {
                            Ok(outcome) => {
                                self.mark_resolved(&swap.id, step, attempt, outcome.tx_hash)?;
                                Ok(Some(SwapStatus::Completed))
                            }
                            Err(err) => {
                                self.schedule_retry(&swap.id, step, &htlc_id, attempt)?;
                                Err(err)
                            }
                        }
                    }
                }
            }

            NextAction::Refund => {
                let step = "refund";
                let htlc_id = swap.id.to_hex();
                let now = Utc::now().timestamp();

                match self
                    .decide_step(&swap.id, step, &swap.source.chain_id, &htlc_id, now, |record| record.refunded)
                    .await?
                {
                    StepDecision::AlreadyLanded => Ok(Some(SwapStatus::Refunded)),
                    StepDecision::Exhausted => {
                        warn!(swap_id = %swap.id, "refund retries exhausted, marking failed");
                        Ok(Some(SwapStatus::Failed))
                    }
                    StepDecision::NotYetDue => Ok(None),
                    StepDecision::Proceed(attempt) => {
                        let adapter = self.adapter_for(&swap.source.chain_id)?;
                        match adapter.refund(&swap.source.chain_id, &htlc_id).await {
                            Ok(outcome) => {
                                self.mark_resolved(&swap.id, step, attempt, outcome.tx_hash)?;
                                Ok(Some(SwapStatus::Refunded))
                            }
                            Err(err) => {
                                self.schedule_retry(&swap.id, step, &htlc_id, attempt)?;
                                Err(err)
                            }
                        }
                    }
                }
            }
        }
    }

    fn adapter_for(&self, chain_id: &ChainId) -> Result<Arc<ChainAdapter>, RelayError> {
        self.adapters
            .get(chain_id)
            .cloned()
            .ok_or_else(|| RelayError::NoHealthyEndpoint(chain_id.0.clone()))
    }

    /// The idempotency/at-most-once contract for one `(swapId, step)`: never
    /// resubmit a chain call without first checking whether the prior
    /// attempt already landed, and never retry past `max_step_retries`.
    async fn decide_step(
        &self,
        swap_id: &relay_core::types::SwapId,
        step: &str,
        chain_id: &ChainId,
        htlc_id: &str,
        now: Timestamp,
        landed: impl Fn(&HtlcRecord) -> bool,
    ) -> Result<StepDecision, RelayError> {
        let intent = self.load_or_create_intent(swap_id, step)?;
        if intent.is_resolved() {
            return Ok(StepDecision::AlreadyLanded);
        }

        let adapter = self.adapter_for(chain_id)?;
        if let Some(record) = adapter.get_htlc(chain_id, htlc_id).await? {
            if landed(&record) {
                self.mark_resolved(swap_id, step, intent.tx_attempt, "observed-via-query")?;
                return Ok(StepDecision::AlreadyLanded);
            }
        }

        if intent.tx_attempt >= self.config.max_step_retries {
            return Ok(StepDecision::Exhausted);
        }

        if now < intent.next_retry_at {
            return Ok(StepDecision::NotYetDue);
        }

        // The HTLC query above found nothing yet, but the prior attempt's
        // identifier may already have landed on-chain without creating a
        // visible record (e.g. a resubmitted nonce/sequence rejected by the
        // chain as a duplicate); wait for the query to catch up rather than
        // submit a second attempt blind.
        if adapter.nonce_consumed(chain_id, htlc_id).await? {
            return Ok(StepDecision::NotYetDue);
        }

        Ok(StepDecision::Proceed(intent.tx_attempt))
    }

    fn load_or_create_intent(&self, swap_id: &relay_core::types::SwapId, step: &str) -> Result<Intent, RelayError> {
        if let Some(existing) = self.store.get_intent(swap_id, step)? {
            return Ok(existing);
        }
        let now = Utc::now().timestamp();
        let intent = Intent::new(swap_id.clone(), step, 0, now);
        self.store.put_intent(&intent)?;
        Ok(intent)
    }

    fn mark_resolved(
        &self,
        swap_id: &relay_core::types::SwapId,
        step: &str,
        attempt: u32,
        receipt: impl Into<String>,
    ) -> Result<(), RelayError> {
        let now = Utc::now().timestamp();
        let mut intent = Intent::new(swap_id.clone(), step, attempt, now);
        intent.receipt_tx_hash = Some(receipt.into());
        self.store.put_intent(&intent)
    }

    fn schedule_retry(
        &self,
        swap_id: &relay_core::types::SwapId,
        step: &str,
        htlc_id: &str,
        failed_attempt: u32,
    ) -> Result<(), RelayError> {
        let now = Utc::now().timestamp();
        let backoff = backoff_full_jitter(
            self.config.retry_base_backoff_ms,
            failed_attempt,
            self.config.retry_backoff_cap_ms,
        );
        let mut intent = Intent::new(swap_id.clone(), step, failed_attempt + 1, now);
        intent.nonce_or_seq = Some(htlc_id.to_string());
        intent.next_retry_at = now + (backoff.as_millis() as i64 / 1000).max(1);
        self.store.put_intent(&intent)
    }

    /// Classifies a failed step per the error propagation rules: retryable
    /// errors surface up to the caller unchanged so it can schedule a
    /// backoff retry; terminal-refundable errors move the swap to
    /// `Refunding`; everything else is `Failed`.
    fn classify_failure(&self, err: &RelayError) -> Result<SwapStatus, RelayError> {
        if err.is_retryable() {
            return Err(RelayError::Other(err.to_string()));
        }
        if err.is_terminal_refundable() {
            return Ok(SwapStatus::Refunding);
        }
        Ok(SwapStatus::Failed)
    }
}

/// Outcome of `decide_step`'s idempotency check for one drive tick.
enum StepDecision {
    /// The prior attempt (or an earlier process's) already landed on-chain.
    AlreadyLanded,
    /// `max_step_retries` reached without a resolved receipt.
    Exhausted,
    /// A retry is owed but the backoff window hasn't elapsed yet.
    NotYetDue,
    /// Safe to submit; carries the attempt number to record against.
    Proceed(u32),
}

fn hop_htlc_id(swap: &Swap, hop_index: usize) -> String {
    format!("{}-hop{}", swap.id.to_hex(), hop_index)
}

/// Pure application of an observed C2 event onto swap state. Returns `true`
/// if the event caused a transition.
pub fn apply_observed_event(swap: &mut Swap, event: &Event) -> bool {
    match (swap.status, event.kind) {
        (SwapStatus::Pending, EventKind::HtlcCreated) if event.chain_id == swap.source.chain_id => {
            swap.status = SwapStatus::SourceLocked;
            true
        }
        (SwapStatus::HopsInFlight(i), EventKind::IbcAck) => {
            swap.receipts.push(Receipt {
                hop_index: i as usize,
                direction: ReceiptDirection::Forward,
                tx_hash: event.tx_hash.clone(),
                block_height: event.block_height,
                observed_at: Utc::now().timestamp(),
            });
            let next = i + 1;
            swap.status = if (next as usize) >= swap.route.len() {
                SwapStatus::DestLocked
            } else {
                SwapStatus::HopsInFlight(next)
            };
            true
        }
        (SwapStatus::DestLocked, EventKind::HtlcWithdrawn) if event.chain_id == swap.destination.chain_id => {
            if let Some(preimage_hex) = event.payload.get("preimage").and_then(|v| v.as_str()) {
                if let Ok(bytes) = hex::decode(preimage_hex) {
                    if bytes.len() == 32 {
                        let mut preimage = [0u8; 32];
                        preimage.copy_from_slice(&bytes);
                        if relay_crypto::verify_preimage(swap.secret.algo, &preimage, &swap.secret.hash) {
                            swap.secret.preimage = Some(preimage);
                            swap.status = SwapStatus::DestWithdrawn;
                            return true;
                        }
                    }
                }
            }
            false
        }
        (SwapStatus::SecretPropagating(i), EventKind::IbcAck) => {
            swap.receipts.push(Receipt {
                hop_index: i as usize,
                direction: ReceiptDirection::Backward,
                tx_hash: event.tx_hash.clone(),
                block_height: event.block_height,
                observed_at: Utc::now().timestamp(),
            });
            true
        }
        _ => false,
    }
}
