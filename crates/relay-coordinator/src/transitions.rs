use relay_core::types::{Swap, SwapStatus, Timestamp};

/// What the drive loop should do next for a swap already past its
/// event-driven preconditions. Transitions that only advance on an observed
/// chain event (source lock, dest withdrawal, hop ack) are not modeled here
/// — see `apply_event`.
#[derive(Debug, PartialEq, Eq)]
pub enum NextAction {
    /// Nothing to do; waiting on an external event or already terminal.
    None,
    ComputeRoute,
    SendHop(usize),
    PropagateSecret(usize),
    SourceWithdraw,
    Refund,
}

/// Pure function from swap state to intended action. `now` is only used to
/// detect a missed deadline (any non-terminal state whose `expiresAt` has
/// passed moves to `Refunding` regardless of its current step).
pub fn next_action(swap: &Swap, now: Timestamp) -> NextAction {
    if !swap.status.is_terminal() && swap.status != SwapStatus::Refunding && now > swap.expires_at() {
        return NextAction::Refund;
    }

    match swap.status {
        SwapStatus::Pending => NextAction::None,
        SwapStatus::SourceLocked => NextAction::ComputeRoute,
        SwapStatus::RouteComputed => NextAction::SendHop(0),
        SwapStatus::HopsInFlight(i) => {
            if swap.receipts.iter().any(|r| {
                r.hop_index == i as usize && r.direction == relay_core::types::ReceiptDirection::Forward
            }) {
                NextAction::None
            } else {
                NextAction::SendHop(i as usize)
            }
        }
        SwapStatus::DestLocked => NextAction::None,
        SwapStatus::DestWithdrawn => {
            if swap.route.is_empty() {
                NextAction::SourceWithdraw
            } else {
                NextAction::PropagateSecret(swap.route.len() - 1)
            }
        }
        SwapStatus::SecretPropagating(i) => {
            if i == 0 {
                NextAction::SourceWithdraw
            } else {
                NextAction::PropagateSecret((i - 1) as usize)
            }
        }
        SwapStatus::SourceWithdrawn => NextAction::None,
        SwapStatus::Refunding => NextAction::Refund,
        SwapStatus::Completed
        | SwapStatus::Refunded
        | SwapStatus::Failed
        | SwapStatus::Expired => NextAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::types::{Amount, ChainId, Secret, SecretAlgo, SwapId, SwapParty, Timelock};

    fn base_swap(status: SwapStatus) -> Swap {
        Swap {
            id: SwapId([1u8; 16]),
            order_id: None,
            status,
            source: SwapParty {
                chain_id: ChainId("evm-1".into()),
                address: relay_core::types::Address("0xabc".into()),
                token: relay_core::types::Denom("wei".into()),
            },
            destination: SwapParty {
                chain_id: ChainId("osmosis-1".into()),
                address: relay_core::types::Address("osmo1xyz".into()),
                token: relay_core::types::Denom("uosmo".into()),
            },
            amount: Amount {
                value: 100,
                decimals: 6,
                symbol: "uosmo".into(),
            },
            timelock: Timelock::new(0, 3_600, 300),
            secret: Secret {
                hash: [1u8; 32],
                preimage: None,
                algo: SecretAlgo::Sha256,
            },
            route: Vec::new(),
            receipts: Vec::new(),
            created_at: 0,
            updated_at: 0,
            version: 0,
        }
    }

    #[test]
    fn source_locked_computes_route() {
        let swap = base_swap(SwapStatus::SourceLocked);
        assert_eq!(next_action(&swap, 10), NextAction::ComputeRoute);
    }

    #[test]
    fn past_deadline_forces_refund_regardless_of_step() {
        let swap = base_swap(SwapStatus::HopsInFlight(0));
        assert_eq!(next_action(&swap, 10_000), NextAction::Refund);
    }

    #[test]
    fn secret_propagating_zero_triggers_source_withdraw() {
        let swap = base_swap(SwapStatus::SecretPropagating(0));
        assert_eq!(next_action(&swap, 10), NextAction::SourceWithdraw);
    }

    #[test]
    fn terminal_states_have_no_next_action() {
        let swap = base_swap(SwapStatus::Completed);
        assert_eq!(next_action(&swap, 999_999), NextAction::None);
    }
}
