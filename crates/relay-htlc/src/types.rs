use relay_core::types::{ChainKind, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AdapterKind {
    Evm,
    Cosmos,
}

impl From<ChainKind> for AdapterKind {
    fn from(kind: ChainKind) -> Self {
        match kind {
            ChainKind::Evm => AdapterKind::Evm,
            ChainKind::Cosmos => AdapterKind::Cosmos,
        }
    }
}

/// On-chain view of an HTLC, as returned by `getHTLC`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct HtlcRecord {
    pub htlc_id: String,
    pub hashlock: [u8; 32],
    pub timelock: Timestamp,
    pub withdrawn: bool,
    pub refunded: bool,
}

#[derive(Clone, Debug)]
pub struct CreateHtlcRequest {
    pub htlc_id: String,
    pub hashlock: [u8; 32],
    pub timelock: Timestamp,
    pub recipient: String,
    pub amount_value: u128,
    pub denom: String,
}

/// Result of a blocking chain call, confirmed `requiredConfirmations` deep.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct TxOutcome {
    pub tx_hash: String,
    pub block_height: u64,
    pub confirmations: u64,
}
