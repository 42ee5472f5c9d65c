use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::ReputationClass;

/// External reputation feed, consumed as an opaque collaborator (the feed's
/// wire protocol — threat-intel API, GeoIP-style lookup service — is out of
/// scope here).
pub trait ReputationSource: Send + Sync {
    fn classify(&self, ip: &str) -> ReputationClass;
}

/// Static source for tests and offline deployments: everything not
/// explicitly classified is `Neutral`.
pub struct StaticReputationSource {
    overrides: Mutex<HashMap<String, ReputationClass>>,
}

impl StaticReputationSource {
    pub fn new() -> Self {
        Self {
            overrides: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, ip: &str, class: ReputationClass) {
        self.overrides.lock().unwrap().insert(ip.to_string(), class);
    }
}

impl Default for StaticReputationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReputationSource for StaticReputationSource {
    fn classify(&self, ip: &str) -> ReputationClass {
        self.overrides
            .lock()
            .unwrap()
            .get(ip)
            .copied()
            .unwrap_or(ReputationClass::Neutral)
    }
}

pub struct ReputationLayer {
    source: Box<dyn ReputationSource>,
}

impl ReputationLayer {
    pub fn new(source: Box<dyn ReputationSource>) -> Self {
        Self { source }
    }

    pub fn score(&self, ip: &str) -> f64 {
        self.source.classify(ip).score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclassified_ip_is_neutral() {
        let source = StaticReputationSource::new();
        let layer = ReputationLayer::new(Box::new(source));
        assert_eq!(layer.score("9.9.9.9"), ReputationClass::Neutral.score());
    }

    #[test]
    fn malicious_override_scores_max() {
        let source = StaticReputationSource::new();
        source.set("6.6.6.6", ReputationClass::Malicious);
        let layer = ReputationLayer::new(Box::new(source));
        assert_eq!(layer.score("6.6.6.6"), 100.0);
    }
}
