use relay_core::error::RelayError;
use relay_core::types::Timestamp;

use crate::types::HtlcRecord;

/// `withdraw` precondition: local state must not already be Withdrawn or
/// Refunded, and the current height/time must not exceed the timelock.
/// B1: timelock equal to current height is half-open at the top — withdraw
/// is still accepted exactly at the boundary.
pub fn check_withdraw(record: &HtlcRecord, now: Timestamp) -> Result<(), RelayError> {
    if record.withdrawn {
        return Err(RelayError::HtlcAlreadyExists(record.htlc_id.clone()));
    }
    if record.refunded {
        return Err(RelayError::HtlcExpired(record.htlc_id.clone()));
    }
    if now > record.timelock {
        return Err(RelayError::HtlcExpired(record.htlc_id.clone()));
    }
    Ok(())
}

/// `refund` precondition: current height/time must strictly exceed the
/// timelock. B1: exactly at the timelock, refund is rejected.
pub fn check_refund(record: &HtlcRecord, now: Timestamp) -> Result<(), RelayError> {
    if record.refunded {
        return Err(RelayError::HtlcAlreadyExists(record.htlc_id.clone()));
    }
    if record.withdrawn {
        return Err(RelayError::HtlcAlreadyExists(record.htlc_id.clone()));
    }
    if now <= record.timelock {
        return Err(RelayError::HtlcNotFound(format!(
            "{}: timelock not yet passed",
            record.htlc_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timelock: Timestamp, withdrawn: bool, refunded: bool) -> HtlcRecord {
        HtlcRecord {
            htlc_id: "h1".into(),
            hashlock: [0u8; 32],
            timelock,
            withdrawn,
            refunded,
        }
    }

    #[test]
    fn withdraw_accepted_at_exact_timelock_boundary() {
        let r = record(100, false, false);
        assert!(check_withdraw(&r, 100).is_ok());
    }

    #[test]
    fn withdraw_rejected_past_timelock() {
        let r = record(100, false, false);
        assert!(check_withdraw(&r, 101).is_err());
    }

    #[test]
    fn refund_rejected_at_exact_timelock_boundary() {
        let r = record(100, false, false);
        assert!(check_refund(&r, 100).is_err());
    }

    #[test]
    fn refund_accepted_just_past_timelock() {
        let r = record(100, false, false);
        assert!(check_refund(&r, 101).is_ok());
    }

    #[test]
    fn withdraw_rejected_if_already_withdrawn_or_refunded() {
        assert!(check_withdraw(&record(100, true, false), 50).is_err());
        assert!(check_withdraw(&record(100, false, true), 50).is_err());
    }
}
