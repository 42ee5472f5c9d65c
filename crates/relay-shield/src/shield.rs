use std::collections::HashMap;
use std::sync::Mutex;

use relay_core::error::RelayError;
use relay_core::types::Timestamp;
use tracing::{info, warn};

use crate::defense::DefenseLevel;
use crate::geo::GeoLayer;
use crate::pattern::PatternLayer;
use crate::reputation::ReputationLayer;
use crate::resource::ResourceLayer;
use crate::score::{aggregate, decide, LayerScores};
use crate::types::{Action, Decision, DecisionBucket, RequestFingerprint};
use crate::volume::VolumeLayer;

struct Blacklist {
    entries: Mutex<HashMap<String, Timestamp>>,
}

impl Blacklist {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn ban(&self, ip: &str, until: Timestamp) {
        self.entries.lock().unwrap().insert(ip.to_string(), until);
    }

    fn is_banned(&self, ip: &str, now: Timestamp) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(ip)
            .is_some_and(|&until| now < until)
    }
}

/// Layered request-scoring pipeline: each request is scored by five
/// independent layers (volume, reputation, resource, pattern, geo),
/// combined into a single weighted score, scaled by the adaptive defense
/// level, and bucketed into an enforcement action.
pub struct DdosShield {
    volume: Mutex<VolumeLayer>,
    reputation: ReputationLayer,
    resource: ResourceLayer,
    pattern: Mutex<PatternLayer>,
    geo: GeoLayer,
    defense: DefenseLevel,
    blacklist: Blacklist,
    emergency_stopped: Mutex<Option<String>>,
}

impl DdosShield {
    pub fn new(reputation: ReputationLayer, geo: GeoLayer, resource_threshold: f64, now: Timestamp) -> Self {
        Self {
            volume: Mutex::new(VolumeLayer::default_limits()),
            reputation,
            resource: ResourceLayer::new(resource_threshold),
            pattern: Mutex::new(PatternLayer::new()),
            geo,
            defense: DefenseLevel::new(now),
            blacklist: Blacklist::new(),
            emergency_stopped: Mutex::new(None),
        }
    }

    pub fn report_resource_stress(&self, fraction: f64) {
        self.resource.report_stress(fraction);
    }

    pub fn current_defense_level(&self) -> u8 {
        self.defense.current()
    }

    /// Scores one request and returns the enforcement decision. Blacklisted
    /// IPs and an active emergency stop short-circuit straight to a block
    /// without running the scoring layers.
    pub fn evaluate(&self, fp: &RequestFingerprint, now: Timestamp) -> Decision {
        if let Some(reason) = self.emergency_stopped.lock().unwrap().as_ref() {
            warn!(ip = %fp.ip, reason = %reason, "request rejected, shield is in emergency stop");
            return Decision {
                bucket: DecisionBucket::Critical,
                action: Action::EmergencyBlock { secs: relay_core::constants::SHIELD_EMERGENCY_BLOCK_SECS },
                score: 100.0,
            };
        }
        if self.blacklist.is_banned(&fp.ip, now) {
            return Decision {
                bucket: DecisionBucket::High,
                action: Action::Block { secs: relay_core::constants::SHIELD_BLOCK_SECS },
                score: 100.0,
            };
        }

        let scores = LayerScores {
            volume: self.volume.lock().unwrap().score(&fp.ip, &fp.path, now),
            pattern: self.pattern.lock().unwrap().score(fp),
            reputation: self.reputation.score(&fp.ip),
            resource: self.resource.score(),
            geo: self.geo.score(&fp.ip),
        };
        let aggregated = aggregate(&scores, self.defense.current());
        let decision = decide(aggregated);

        self.defense.observe(decision.bucket, now);
        if matches!(decision.bucket, DecisionBucket::High | DecisionBucket::Critical) {
            if let Action::Block { secs } | Action::EmergencyBlock { secs } = decision.action {
                self.blacklist.ban(&fp.ip, now + secs);
            }
            warn!(ip = %fp.ip, score = decision.score, bucket = ?decision.bucket, "elevated threat decision");
        }

        decision
    }

    pub fn blacklist_ip(&self, ip: &str, duration_secs: i64, reason: &str, now: Timestamp) {
        info!(ip, reason, "manual blacklist");
        self.blacklist.ban(ip, now + duration_secs);
    }

    pub fn emergency_stop(&self, reason: impl Into<String>) -> Result<(), RelayError> {
        let reason = reason.into();
        warn!(reason = %reason, "ddos shield entering emergency stop");
        *self.emergency_stopped.lock().unwrap() = Some(reason);
        Ok(())
    }

    pub fn resume(&self) {
        *self.emergency_stopped.lock().unwrap() = None;
    }

    pub fn is_emergency_stopped(&self) -> bool {
        self.emergency_stopped.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::StaticGeoSource;
    use crate::reputation::StaticReputationSource;

    fn shield() -> DdosShield {
        DdosShield::new(
            ReputationLayer::new(Box::new(StaticReputationSource::new())),
            GeoLayer::new(Box::new(StaticGeoSource::new(0.0))),
            0.8,
            0,
        )
    }

    fn fp(ip: &str, ts: Timestamp) -> RequestFingerprint {
        RequestFingerprint {
            ip: ip.into(),
            path: "/swaps".into(),
            method: "GET".into(),
            user_agent: "Mozilla/5.0 real browser".into(),
            body_size: 10,
            timestamp: ts,
        }
    }

    #[test]
    fn clean_request_is_allowed() {
        let shield = shield();
        let decision = shield.evaluate(&fp("1.2.3.4", 0), 0);
        assert_eq!(decision.action, Action::Allow);
    }

    #[test]
    fn blacklisted_ip_is_blocked_without_scoring() {
        let shield = shield();
        shield.blacklist_ip("9.9.9.9", 3600, "manual ban", 0);
        let decision = shield.evaluate(&fp("9.9.9.9", 1), 1);
        assert!(matches!(decision.action, Action::Block { .. }));
    }

    #[test]
    fn emergency_stop_rejects_all_requests() {
        let shield = shield();
        shield.emergency_stop("operator triggered").unwrap();
        let decision = shield.evaluate(&fp("1.2.3.4", 0), 0);
        assert!(matches!(decision.action, Action::EmergencyBlock { .. }));
        shield.resume();
        let decision = shield.evaluate(&fp("1.2.3.4", 1), 1);
        assert_eq!(decision.action, Action::Allow);
    }
}
