use thiserror::Error;

/// Stable wire-visible error code. Ranges preserve the taxonomy from the
/// error-handling design: Config 1xxx, Validation 2xxx, Chain 3xxx (IBC/HTLC
/// 31xx/32xx), Resource 4xxx, Security 5xxx.
pub type ErrorCode = u32;

#[derive(Debug, Error)]
pub enum RelayError {
    // ── Config (1xxx) ─────────────────────────────────────────────────────────
    #[error("missing config field: {0}")]
    ConfigMissing(String),

    #[error("invalid config value for {field}: {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error("config type mismatch for {field}: expected {expected}")]
    ConfigTypeMismatch { field: String, expected: String },

    // ── Validation (2xxx) ────────────────────────────────────────────────────
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid channel id: {0}")]
    InvalidChannelId(String),

    #[error("invalid denom: {0}")]
    InvalidDenom(String),

    #[error("source and destination chain must differ")]
    SameChain,

    // ── Chain (3xxx) ──────────────────────────────────────────────────────────
    #[error("chain unreachable: {0}")]
    ChainUnreachable(String),

    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch { expected: String, got: String },

    #[error("insufficient gas")]
    InsufficientGas,

    #[error("rpc timeout after {millis}ms")]
    RpcTimeout { millis: u64 },

    // ── HTLC (31xx) ───────────────────────────────────────────────────────────
    #[error("htlc already exists: {0}")]
    HtlcAlreadyExists(String),

    #[error("htlc not found: {0}")]
    HtlcNotFound(String),

    #[error("htlc expired: {0}")]
    HtlcExpired(String),

    #[error("invalid secret: preimage does not hash to the committed value")]
    InvalidSecret,

    // ── IBC (32xx) ────────────────────────────────────────────────────────────
    #[error("ibc channel closed: {0}")]
    ChannelClosed(String),

    #[error("ibc packet timeout on channel {0}")]
    PacketTimeout(String),

    #[error("ibc packet failed: {0}")]
    PacketFailed(String),

    #[error("no feasible route from {source} to {destination}")]
    NoFeasibleRoute { source: String, destination: String },

    // ── Resource (4xxx) ───────────────────────────────────────────────────────
    #[error("no healthy endpoint for chain {0}")]
    NoHealthyEndpoint(String),

    #[error("backpressure: downstream buffer exceeds high watermark")]
    Backpressure,

    #[error("monitor stalled for chain {0}")]
    MonitorStalled(String),

    #[error("conflict: record already exists")]
    Conflict,

    #[error("stale version: expected {expected}, got {got}")]
    Stale { expected: u64, got: u64 },

    #[error("lease held by another worker")]
    LeaseContended,

    // ── Security (5xxx) ───────────────────────────────────────────────────────
    #[error("rate limited")]
    RateLimited,

    #[error("reputation blocked: {0}")]
    ReputationBlocked(String),

    #[error("emergency mode active")]
    EmergencyBlocked,

    // ── Storage / serialization ───────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::ConfigMissing(_) => 1001,
            RelayError::ConfigInvalid { .. } => 1002,
            RelayError::ConfigTypeMismatch { .. } => 1003,

            RelayError::InvalidAddress(_) => 2001,
            RelayError::InvalidAmount(_) => 2002,
            RelayError::InvalidChannelId(_) => 2003,
            RelayError::InvalidDenom(_) => 2004,
            RelayError::SameChain => 2005,

            RelayError::ChainUnreachable(_) => 3001,
            RelayError::ChainIdMismatch { .. } => 3002,
            RelayError::InsufficientGas => 3003,
            RelayError::RpcTimeout { .. } => 3004,

            RelayError::HtlcAlreadyExists(_) => 3101,
            RelayError::HtlcNotFound(_) => 3102,
            RelayError::HtlcExpired(_) => 3103,
            RelayError::InvalidSecret => 3104,

            RelayError::ChannelClosed(_) => 3201,
            RelayError::PacketTimeout(_) => 3202,
            RelayError::PacketFailed(_) => 3203,
            RelayError::NoFeasibleRoute { .. } => 3204,

            RelayError::NoHealthyEndpoint(_) => 4001,
            RelayError::Backpressure => 4002,
            RelayError::MonitorStalled(_) => 4003,
            RelayError::Conflict => 4004,
            RelayError::Stale { .. } => 4005,
            RelayError::LeaseContended => 4006,

            RelayError::RateLimited => 5001,
            RelayError::ReputationBlocked(_) => 5002,
            RelayError::EmergencyBlocked => 5003,

            RelayError::Storage(_) => 9001,
            RelayError::Serialization(_) => 9002,
            RelayError::Other(_) => 9999,
        }
    }

    /// Whether a coordinator step failing with this error should be retried
    /// with backoff rather than immediately classified terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RelayError::ChainUnreachable(_)
                | RelayError::RpcTimeout { .. }
                | RelayError::NoHealthyEndpoint(_)
                | RelayError::Backpressure
                | RelayError::MonitorStalled(_)
                | RelayError::PacketTimeout(_)
        )
    }

    /// Whether this error should drive the swap into the Refunding branch
    /// rather than Failed.
    pub fn is_terminal_refundable(&self) -> bool {
        matches!(
            self,
            RelayError::HtlcExpired(_)
                | RelayError::ChannelClosed(_)
                | RelayError::PacketFailed(_)
                | RelayError::NoFeasibleRoute { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_fall_in_their_taxonomy_range() {
        assert_eq!(RelayError::ConfigMissing("x".into()).code() / 1000, 1);
        assert_eq!(RelayError::InvalidAddress("x".into()).code() / 1000, 2);
        assert_eq!(RelayError::ChainUnreachable("x".into()).code() / 1000, 3);
        assert_eq!(RelayError::NoHealthyEndpoint("x".into()).code() / 1000, 4);
        assert_eq!(RelayError::RateLimited.code() / 1000, 5);
    }

    #[test]
    fn retryable_and_refundable_are_disjoint_for_sampled_variants() {
        assert!(RelayError::RpcTimeout { millis: 100 }.is_retryable());
        assert!(!RelayError::RpcTimeout { millis: 100 }.is_terminal_refundable());
        assert!(RelayError::HtlcExpired("x".into()).is_terminal_refundable());
        assert!(!RelayError::HtlcExpired("x".into()).is_retryable());
    }
}
