use std::sync::atomic::Ordering;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use relay_core::constants::DEFAULT_MIN_HOP_BUFFER_SECS;
use relay_core::error::RelayError;
use relay_core::types::{Address, Amount, ChainId, Denom, Secret, SwapId, SwapParty, Timelock};
use relay_core::types::Swap;
use relay_core::validate::{normalize_address, validate_amount_value, validate_denom};

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{
    BlacklistRequest, CreateSwapRequest, CreateSwapResponse, EmergencyStopRequest, HealthResponse,
    SwapView,
};

pub async fn create_swap(
    State(state): State<AppState>,
    Json(req): Json<CreateSwapRequest>,
) -> Result<(StatusCode, Json<CreateSwapResponse>), ApiError> {
    let source_chain_id = ChainId(req.source_chain_id.clone());
    let dest_chain_id = ChainId(req.dest_chain_id.clone());
    if source_chain_id == dest_chain_id {
        return Err(RelayError::SameChain.into());
    }

    let source_chain = state
        .registry
        .get_chain(&source_chain_id)
        .ok_or_else(|| RelayError::InvalidAddress(format!("unknown chain: {}", source_chain_id)))?;
    let dest_chain = state
        .registry
        .get_chain(&dest_chain_id)
        .ok_or_else(|| RelayError::InvalidAddress(format!("unknown chain: {}", dest_chain_id)))?;

    let source_address = normalize_address(
        source_chain.kind,
        &req.source_address,
        source_chain.addr_prefix.as_deref(),
    )?;
    let dest_address = normalize_address(
        dest_chain.kind,
        &req.dest_address,
        dest_chain.addr_prefix.as_deref(),
    )?;

    validate_denom(&req.source_token)?;
    validate_denom(&req.dest_token)?;

    let amount_value: u128 = req
        .amount_value
        .parse()
        .map_err(|_| RelayError::InvalidAmount(format!("not an integer: {}", req.amount_value)))?;
    validate_amount_value(amount_value)?;

    let hashlock_bytes = hex::decode(&req.hashlock)
        .map_err(|_| RelayError::InvalidSecret)?;
    if hashlock_bytes.len() != 32 {
        return Err(RelayError::InvalidSecret.into());
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hashlock_bytes);

    let now = Utc::now().timestamp();
    let duration = req.deadline - now;
    if duration <= 0 {
        return Err(RelayError::InvalidAmount("deadline must be in the future".into()).into());
    }
    let buffer = DEFAULT_MIN_HOP_BUFFER_SECS.min(duration - 1).max(0);
    let timelock = Timelock::new(now, duration, buffer);
    if !timelock.is_valid() {
        return Err(RelayError::InvalidAmount("deadline too close to allow a timelock buffer".into()).into());
    }

    let swap = Swap {
        id: SwapId(rand::random()),
        order_id: None,
        status: relay_core::types::SwapStatus::Pending,
        source: SwapParty {
            chain_id: source_chain_id,
            address: Address(source_address),
            token: Denom(req.source_token.clone()),
        },
        destination: SwapParty {
            chain_id: dest_chain_id,
            address: Address(dest_address),
            token: Denom(req.dest_token.clone()),
        },
        amount: Amount {
            value: amount_value,
            decimals: req.amount_decimals,
            symbol: req.amount_symbol.clone(),
        },
        timelock,
        secret: Secret {
            hash,
            preimage: None,
            algo: req.secret_algo.into(),
        },
        route: Vec::new(),
        receipts: Vec::new(),
        created_at: now,
        updated_at: now,
        version: 0,
    };

    state.store.create(&swap)?;
    state.metrics.inc_swaps_created();

    Ok((
        StatusCode::CREATED,
        Json(CreateSwapResponse {
            id: swap.id.to_hex(),
            status: "Pending".into(),
        }),
    ))
}

pub async fn get_swap(
    State(state): State<AppState>,
    Path(id_hex): Path<String>,
) -> Result<Json<SwapView>, ApiError> {
    let id = SwapId::from_hex(&id_hex).map_err(|e| RelayError::InvalidAddress(e.to_string()))?;
    let swap = state
        .store
        .get(&id)?
        .ok_or_else(|| RelayError::HtlcNotFound(id_hex))?;
    Ok(Json(SwapView::from(&swap)))
}

pub async fn emergency_stop(
    State(state): State<AppState>,
    Json(req): Json<EmergencyStopRequest>,
) -> Result<StatusCode, ApiError> {
    state.coordinator.emergency_stop(&req.reason);
    state.shield.emergency_stop(req.reason.clone())?;
    Ok(StatusCode::OK)
}

pub async fn blacklist_ip(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Json(req): Json<BlacklistRequest>,
) -> Result<StatusCode, ApiError> {
    let now = Utc::now().timestamp();
    let duration = req.duration_sec.unwrap_or(relay_core::constants::SHIELD_BLOCK_SECS);
    state.shield.blacklist_ip(&ip, duration, &req.reason, now);
    Ok(StatusCode::OK)
}

/// 200 iff monitors are healthy and no *primary* pool member (the first
/// configured endpoint for each chain) has an Open circuit.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let monitors_healthy = state.monitors_healthy.load(Ordering::Relaxed);

    let mut open_circuits = 0usize;
    for pool in state.pools.iter() {
        if let Some(primary) = pool.snapshot().await.into_iter().next() {
            if primary.circuit_state == relay_core::types::CircuitState::Open {
                open_circuits += 1;
            }
        }
    }

    let healthy = monitors_healthy && open_circuits == 0;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(HealthResponse {
            healthy,
            monitors_healthy,
            open_circuits,
        }),
    )
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render_prometheus()
}
