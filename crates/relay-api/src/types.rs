use serde::{Deserialize, Serialize};

use relay_core::types::{SecretAlgo, Swap, SwapStatus};

/// `POST /swaps` request body. `amountValue` is carried as a decimal string
/// since it is a `u128` in base units and JSON numbers lose precision past
/// 2^53.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequest {
    pub source_chain_id: String,
    pub dest_chain_id: String,
    pub source_address: String,
    pub dest_address: String,
    pub source_token: String,
    pub dest_token: String,
    pub amount_value: String,
    pub amount_decimals: u8,
    pub amount_symbol: String,
    /// Hex-encoded 32-byte hashlock the caller already committed to on the
    /// source chain.
    pub hashlock: String,
    pub secret_algo: SecretAlgoDto,
    /// Advisory only; this relayer has no pricing/quoting component, so the
    /// value is validated and stored but does not affect routing.
    pub slippage_bps: u16,
    /// Unix timestamp the source timelock must not outlive.
    pub deadline: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretAlgoDto {
    Sha256,
    Keccak256,
}

impl From<SecretAlgoDto> for SecretAlgo {
    fn from(v: SecretAlgoDto) -> Self {
        match v {
            SecretAlgoDto::Sha256 => SecretAlgo::Sha256,
            SecretAlgoDto::Keccak256 => SecretAlgo::Keccak256,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapResponse {
    pub id: String,
    pub status: String,
}

/// JSON view of a `Swap` document for `GET /swaps/{id}`. Mirrors the stored
/// aggregate field-for-field; `HopsInFlight`/`SecretPropagating` render as
/// `"HopsInFlight(2)"` so the carried hop index stays visible to operators.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapView {
    pub id: String,
    pub order_id: Option<String>,
    pub status: String,
    pub source_chain_id: String,
    pub source_address: String,
    pub source_token: String,
    pub dest_chain_id: String,
    pub dest_address: String,
    pub dest_token: String,
    pub amount_value: String,
    pub amount_decimals: u8,
    pub amount_symbol: String,
    pub hashlock: String,
    pub preimage: Option<String>,
    pub hop_count: usize,
    pub receipt_count: usize,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: i64,
    pub version: u64,
}

impl From<&Swap> for SwapView {
    fn from(s: &Swap) -> Self {
        Self {
            id: s.id.to_hex(),
            order_id: s.order_id.as_ref().map(|o| o.0.clone()),
            status: status_str(&s.status),
            source_chain_id: s.source.chain_id.0.clone(),
            source_address: s.source.address.0.clone(),
            source_token: s.source.token.0.clone(),
            dest_chain_id: s.destination.chain_id.0.clone(),
            dest_address: s.destination.address.0.clone(),
            dest_token: s.destination.token.0.clone(),
            amount_value: s.amount.value.to_string(),
            amount_decimals: s.amount.decimals,
            amount_symbol: s.amount.symbol.clone(),
            hashlock: s.secret.hash_hex(),
            preimage: s.secret.preimage.map(hex::encode),
            hop_count: s.route.len(),
            receipt_count: s.receipts.len(),
            created_at: s.created_at,
            updated_at: s.updated_at,
            expires_at: s.expires_at(),
            version: s.version,
        }
    }
}

fn status_str(status: &SwapStatus) -> String {
    match status {
        SwapStatus::Pending => "Pending".into(),
        SwapStatus::SourceLocked => "SourceLocked".into(),
        SwapStatus::RouteComputed => "RouteComputed".into(),
        SwapStatus::HopsInFlight(i) => format!("HopsInFlight({i})"),
        SwapStatus::DestLocked => "DestLocked".into(),
        SwapStatus::DestWithdrawn => "DestWithdrawn".into(),
        SwapStatus::SecretPropagating(i) => format!("SecretPropagating({i})"),
        SwapStatus::SourceWithdrawn => "SourceWithdrawn".into(),
        SwapStatus::Completed => "Completed".into(),
        SwapStatus::Refunding => "Refunding".into(),
        SwapStatus::Refunded => "Refunded".into(),
        SwapStatus::Failed => "Failed".into(),
        SwapStatus::Expired => "Expired".into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStopRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistRequest {
    pub reason: String,
    pub duration_sec: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub monitors_healthy: bool,
    pub open_circuits: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}
