use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Monotonically increasing optimistic-concurrency version for store records.
pub type Version = u64;

// ── SwapId ───────────────────────────────────────────────────────────────────

/// Locally unique swap identifier, minted by the store on `create`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SwapId(pub [u8; 16]);

impl SwapId {
    pub fn from_bytes(b: [u8; 16]) -> Self {
        Self(b)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 16];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SwapId({}…)", &self.to_hex()[..8])
    }
}

/// On-chain order identifier, known only once the source HTLC is observed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── ChainId / ChainKind ──────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct ChainId(pub String);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum ChainKind {
    Evm,
    Cosmos,
}

/// A registered chain in the topology (C3).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Chain {
    pub id: ChainId,
    pub kind: ChainKind,
    pub native_denom: String,
    /// Bech32 human-readable prefix; only set for `Cosmos` chains.
    pub addr_prefix: Option<String>,
    /// Average block time in seconds.
    pub block_time: i64,
    pub required_confirmations: u64,
    pub endpoints: Vec<String>,
}

// ── IBC Channel ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum ChannelState {
    Open,
    Closed,
    TryOpen,
    Init,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct IbcChannel {
    pub source_chain: ChainId,
    pub dest_chain: ChainId,
    pub port_id: String,
    pub channel_id: String,
    pub state: ChannelState,
    pub ordering: String,
    pub version: String,
}

// ── Address / Amount ─────────────────────────────────────────────────────────

/// A chain-scoped account address. Storage-normalized per `AddressRules`:
/// EVM addresses lowercased, Cosmos addresses kept as their bech32 string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Address(pub String);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Denomination symbol, e.g. `uatom`, `wei`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Denom(pub String);

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount in base units (non-negative integer), with display metadata.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Amount {
    pub value: u128,
    pub decimals: u8,
    pub symbol: String,
}

/// One side of a swap: chain, address, token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct SwapParty {
    pub chain_id: ChainId,
    pub address: Address,
    pub token: Denom,
}

// ── Timelock ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Timelock {
    pub start_time: Timestamp,
    pub duration: i64,
    pub buffer: i64,
}

impl Timelock {
    pub fn new(start_time: Timestamp, duration: i64, buffer: i64) -> Self {
        Self {
            start_time,
            duration,
            buffer,
        }
    }

    /// `expiryTime = startTime + duration` (both seconds since epoch; see
    /// DESIGN.md for the canonical-unit decision).
    pub fn expiry_time(&self) -> Timestamp {
        self.start_time + self.duration
    }

    pub fn is_valid(&self) -> bool {
        self.duration > 0 && self.buffer >= 0 && self.buffer < self.duration
    }
}

// ── Secret ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum SecretAlgo {
    Sha256,
    Keccak256,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub hash: [u8; 32],
    pub preimage: Option<[u8; 32]>,
    pub algo: SecretAlgo,
}

impl Secret {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Secret {{ hash: {}, preimage: {}, algo: {:?} }}",
            self.hash_hex(),
            if self.preimage.is_some() { "set" } else { "none" },
            self.algo
        )
    }
}

// ── Hop / Route ───────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Hop {
    pub from_chain: ChainId,
    pub to_chain: ChainId,
    pub channel_id: String,
    pub timeout_height: u64,
    pub timeout_timestamp: Timestamp,
    pub expected_timelock: Timestamp,
}

/// Append-only receipt recorded for a hop transaction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Receipt {
    pub hop_index: usize,
    pub direction: ReceiptDirection,
    pub tx_hash: String,
    pub block_height: u64,
    pub observed_at: Timestamp,
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum ReceiptDirection {
    Forward,
    Backward,
}

// ── Swap status ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum SwapStatus {
    Pending,
    SourceLocked,
    RouteComputed,
    HopsInFlight(u32),
    DestLocked,
    DestWithdrawn,
    SecretPropagating(u32),
    SourceWithdrawn,
    Completed,
    Refunding,
    Refunded,
    Failed,
    Expired,
}

impl SwapStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Completed
                | SwapStatus::Refunded
                | SwapStatus::Failed
                | SwapStatus::Expired
        )
    }
}

// ── Swap ──────────────────────────────────────────────────────────────────────

/// The central aggregate: a single cross-chain atomic swap in flight.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Swap {
    pub id: SwapId,
    pub order_id: Option<OrderId>,
    pub status: SwapStatus,
    pub source: SwapParty,
    pub destination: SwapParty,
    pub amount: Amount,
    pub timelock: Timelock,
    pub secret: Secret,
    pub route: Vec<Hop>,
    pub receipts: Vec<Receipt>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: Version,
}

impl Swap {
    pub fn expires_at(&self) -> Timestamp {
        self.timelock.expiry_time()
    }

    /// I1: any swap in `SourceLocked` or later must carry `secret.hash`.
    /// The hash field is mandatory on `Secret` itself, so this checks the
    /// weaker but still meaningful condition that it is non-zero.
    pub fn has_hash_set(&self) -> bool {
        self.secret.hash != [0u8; 32]
    }
}

// ── PoolMember (C1) ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PoolMember {
    pub endpoint_url: String,
    pub healthy: bool,
    pub in_flight: u32,
    pub last_error: Option<String>,
    pub circuit_state: CircuitState,
    pub next_retry_at: Option<Timestamp>,
}

// ── Event (C2) ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum EventKind {
    HtlcCreated,
    HtlcWithdrawn,
    HtlcRefunded,
    IbcPacketSent,
    IbcPacketRecv,
    IbcAck,
    IbcTimeout,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Event {
    pub chain_id: ChainId,
    pub kind: EventKind,
    pub block_height: u64,
    pub tx_index: u32,
    pub log_index: u32,
    pub tx_hash: String,
    pub payload: serde_json::Value,
}

impl Event {
    /// Ordering key within a single chain's stream: `(height, txIndex, logIndex)`.
    pub fn order_key(&self) -> (u64, u32, u32) {
        (self.block_height, self.tx_index, self.log_index)
    }
}
