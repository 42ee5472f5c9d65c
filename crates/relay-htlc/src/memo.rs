use relay_core::error::RelayError;
use relay_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Wire-visible IBC packet memo. Unknown extra keys are ignored by `serde`'s
/// default behavior; a memo missing any required field fails to parse.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IbcMemo {
    #[serde(rename = "type")]
    pub kind: String,
    pub htlc_id: String,
    pub hashlock: String,
    pub timelock: Timestamp,
    pub target_chain: String,
    pub target_address: String,
    pub source_chain: String,
    #[serde(rename = "sourceHTLCId")]
    pub source_htlc_id: String,
}

impl IbcMemo {
    pub const TYPE_HTLC_CREATE: &'static str = "htlc_create";

    pub fn to_json(&self) -> Result<String, RelayError> {
        serde_json::to_string(self).map_err(|e| RelayError::Serialization(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, RelayError> {
        serde_json::from_str(raw).map_err(|e| RelayError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IbcMemo {
        IbcMemo {
            kind: IbcMemo::TYPE_HTLC_CREATE.into(),
            htlc_id: "h1".into(),
            hashlock: "11".repeat(32),
            timelock: 1_700_000_000,
            target_chain: "osmosis-1".into(),
            target_address: "osmo1xyz".into(),
            source_chain: "evm-1".into(),
            source_htlc_id: "0xabc".into(),
        }
    }

    #[test]
    fn round_trips_through_json() {
        let memo = sample();
        let json = memo.to_json().unwrap();
        let back = IbcMemo::from_json(&json).unwrap();
        assert_eq!(memo, back);
    }

    #[test]
    fn wire_fields_are_camel_case() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"htlcId\""));
        assert!(json.contains("\"targetChain\""));
        assert!(json.contains("\"sourceHTLCId\""));
    }

    #[test]
    fn unknown_extra_keys_are_ignored() {
        let mut value: serde_json::Value = serde_json::to_value(sample()).unwrap();
        value["unexpected_field"] = serde_json::json!("ignored");
        let parsed: IbcMemo = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.htlc_id, "h1");
    }

    #[test]
    fn missing_required_field_fails_to_parse() {
        let mut value: serde_json::Value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("hashlock");
        let parsed: Result<IbcMemo, _> = serde_json::from_value(value);
        assert!(parsed.is_err());
    }
}
