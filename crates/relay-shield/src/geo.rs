use std::collections::HashMap;
use std::sync::Mutex;

/// Pluggable country-risk feed, an opaque collaborator like
/// `ReputationSource` — the GeoIP lookup mechanism is out of scope.
pub trait GeoSource: Send + Sync {
    /// Risk score 0-100 for the request's originating country, or `None`
    /// if the IP could not be resolved to a country.
    fn risk_for_ip(&self, ip: &str) -> Option<f64>;
}

pub struct StaticGeoSource {
    risk_by_ip: Mutex<HashMap<String, f64>>,
    default_risk: f64,
}

impl StaticGeoSource {
    pub fn new(default_risk: f64) -> Self {
        Self {
            risk_by_ip: Mutex::new(HashMap::new()),
            default_risk,
        }
    }

    pub fn set(&self, ip: &str, risk: f64) {
        self.risk_by_ip.lock().unwrap().insert(ip.to_string(), risk);
    }
}

impl GeoSource for StaticGeoSource {
    fn risk_for_ip(&self, ip: &str) -> Option<f64> {
        Some(
            self.risk_by_ip
                .lock()
                .unwrap()
                .get(ip)
                .copied()
                .unwrap_or(self.default_risk),
        )
    }
}

pub struct GeoLayer {
    source: Box<dyn GeoSource>,
}

impl GeoLayer {
    pub fn new(source: Box<dyn GeoSource>) -> Self {
        Self { source }
    }

    pub fn score(&self, ip: &str) -> f64 {
        self.source.risk_for_ip(ip).unwrap_or(0.0).clamp(0.0, 100.0)
    }
}
