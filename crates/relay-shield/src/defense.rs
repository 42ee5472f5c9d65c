use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

use relay_core::constants::{DEFENSE_LEVEL_MAX, DEFENSE_LEVEL_MIN, SHIELD_DECAY_INTERVAL_SECS, SHIELD_EMERGENCY_BLOCK_SECS};
use relay_core::types::Timestamp;

use crate::types::DecisionBucket;

/// Adaptive defense level in `[1, 5]`. Sustained `high`/`critical` decisions
/// raise it; an absence of incidents decays it one step per configured
/// interval. Level scales the raw aggregate score before bucketing.
pub struct DefenseLevel {
    level: AtomicU8,
    last_incident_at: AtomicI64,
    last_decay_at: AtomicI64,
    emergency_until: AtomicI64,
}

impl DefenseLevel {
    pub fn new(now: Timestamp) -> Self {
        Self {
            level: AtomicU8::new(DEFENSE_LEVEL_MIN),
            last_incident_at: AtomicI64::new(now),
            last_decay_at: AtomicI64::new(now),
            emergency_until: AtomicI64::new(0),
        }
    }

    pub fn current(&self) -> u8 {
        self.level.load(Ordering::SeqCst)
    }

    pub fn is_emergency(&self, now: Timestamp) -> bool {
        now < self.emergency_until.load(Ordering::SeqCst)
    }

    /// Called after scoring every request; escalates on `High`/`Critical`
    /// buckets, decays on a prolonged quiet period.
    pub fn observe(&self, bucket: DecisionBucket, now: Timestamp) {
        match bucket {
            DecisionBucket::High => {
                self.last_incident_at.store(now, Ordering::SeqCst);
                self.raise();
            }
            DecisionBucket::Critical => {
                self.last_incident_at.store(now, Ordering::SeqCst);
                self.raise();
                self.emergency_until
                    .store(now + SHIELD_EMERGENCY_BLOCK_SECS, Ordering::SeqCst);
            }
            _ => {}
        }
        self.maybe_decay(now);
    }

    fn raise(&self) {
        let _ = self
            .level
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |l| {
                if l < DEFENSE_LEVEL_MAX {
                    Some(l + 1)
                } else {
                    None
                }
            });
    }

    fn maybe_decay(&self, now: Timestamp) {
        let last_decay = self.last_decay_at.load(Ordering::SeqCst);
        if now - last_decay < SHIELD_DECAY_INTERVAL_SECS {
            return;
        }
        self.last_decay_at.store(now, Ordering::SeqCst);
        let last_incident = self.last_incident_at.load(Ordering::SeqCst);
        if now - last_incident >= SHIELD_DECAY_INTERVAL_SECS {
            let _ = self
                .level
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |l| {
                    if l > DEFENSE_LEVEL_MIN {
                        Some(l - 1)
                    } else {
                        None
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_incident_raises_level_and_engages_emergency() {
        let d = DefenseLevel::new(0);
        d.observe(DecisionBucket::Critical, 0);
        assert_eq!(d.current(), 2);
        assert!(d.is_emergency(1));
        assert!(!d.is_emergency(SHIELD_EMERGENCY_BLOCK_SECS + 1));
    }

    #[test]
    fn quiet_period_decays_level() {
        let d = DefenseLevel::new(0);
        d.observe(DecisionBucket::High, 0);
        assert_eq!(d.current(), 2);
        d.observe(DecisionBucket::None, SHIELD_DECAY_INTERVAL_SECS + 1);
        assert_eq!(d.current(), 1);
    }

    #[test]
    fn level_never_exceeds_max() {
        let d = DefenseLevel::new(0);
        for i in 0..10 {
            d.observe(DecisionBucket::High, i * (SHIELD_DECAY_INTERVAL_SECS + 1));
        }
        assert!(d.current() <= DEFENSE_LEVEL_MAX);
    }
}
