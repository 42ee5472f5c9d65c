//! Address and denom validation rules (external interfaces, address/denom
//! rules). Lives here because both `relay-htlc` and `relay-api` depend on it.

use crate::error::RelayError;
use crate::types::ChainKind;

/// Normalizes and validates a chain address for storage.
///
/// EVM: `0x` + 40 hex chars, lowercased. Cosmos: bech32 with a recognized
/// human-readable prefix, kept as-is (bech32 strings are already
/// case-normalized by the encoding).
pub fn normalize_address(kind: ChainKind, addr: &str, expected_hrp: Option<&str>) -> Result<String, RelayError> {
    match kind {
        ChainKind::Evm => {
            let lower = addr.to_ascii_lowercase();
            let hex_part = lower
                .strip_prefix("0x")
                .ok_or_else(|| RelayError::InvalidAddress(addr.to_string()))?;
            if hex_part.len() != crate::constants::EVM_ADDRESS_HEX_LEN
                || !hex_part.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(RelayError::InvalidAddress(addr.to_string()));
            }
            Ok(format!("0x{hex_part}"))
        }
        ChainKind::Cosmos => {
            let (hrp, _data) = bech32::decode(addr)
                .map_err(|_| RelayError::InvalidAddress(addr.to_string()))?;
            if let Some(expected) = expected_hrp {
                if hrp.as_str() != expected {
                    return Err(RelayError::InvalidAddress(addr.to_string()));
                }
            }
            Ok(addr.to_string())
        }
    }
}

/// Denominations must be lowercase 3-16 chars matching `[a-z][a-z0-9]{2,15}`.
pub fn validate_denom(denom: &str) -> Result<(), RelayError> {
    let len_ok = (crate::constants::DENOM_MIN_LEN..=crate::constants::DENOM_MAX_LEN)
        .contains(&denom.len());
    let mut chars = denom.chars();
    let first_ok = chars.next().map(|c| c.is_ascii_lowercase()).unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if len_ok && first_ok && rest_ok {
        Ok(())
    } else {
        Err(RelayError::InvalidDenom(denom.to_string()))
    }
}

/// Amounts are non-negative integers in base units; `value == 0` is invalid
/// for a swap request (a zero-value atomic swap has no economic meaning).
pub fn validate_amount_value(value: u128) -> Result<(), RelayError> {
    if value == 0 {
        Err(RelayError::InvalidAmount("amount must be greater than zero".into()))
    } else {
        Ok(())
    }
}
