use std::collections::HashMap;

use relay_core::types::Timestamp;

use crate::types::RequestFingerprint;

const SUSPICIOUS_PATH_MARKERS: &[&str] = &["/.env", "/wp-admin", "/.git", "/admin/config"];
const TINY_USER_AGENT_LEN: usize = 4;
const OVERSIZE_BODY_BYTES: usize = 1_000_000;
const INTER_ARRIVAL_JITTER_TOLERANCE_MS: i64 = 5;

/// Heuristic scoring for traffic shape: suspicious paths, near-empty
/// user-agents, oversize bodies, and bot-like near-identical inter-arrival
/// times from the same IP.
pub struct PatternLayer {
    last_seen: HashMap<String, (Timestamp, Timestamp)>,
}

impl PatternLayer {
    pub fn new() -> Self {
        Self {
            last_seen: HashMap::new(),
        }
    }

    pub fn score(&mut self, fp: &RequestFingerprint) -> f64 {
        let mut score = 0.0;

        if SUSPICIOUS_PATH_MARKERS.iter().any(|m| fp.path.contains(m)) {
            score += 40.0;
        }
        if fp.user_agent.len() <= TINY_USER_AGENT_LEN {
            score += 20.0;
        }
        if fp.body_size > OVERSIZE_BODY_BYTES {
            score += 25.0;
        }
        if self.is_near_identical_interval(&fp.ip, fp.timestamp) {
            score += 30.0;
        }

        score.clamp(0.0, 100.0)
    }

    fn is_near_identical_interval(&mut self, ip: &str, now: Timestamp) -> bool {
        let (interval, flagged) = match self.last_seen.get(ip) {
            Some(&(prev_ts, prev_interval)) => {
                let interval = now - prev_ts;
                let flagged = prev_interval > 0 && (interval - prev_interval).abs() <= INTER_ARRIVAL_JITTER_TOLERANCE_MS;
                (interval, flagged)
            }
            None => (0, false),
        };
        self.last_seen.insert(ip.to_string(), (now, interval));
        flagged
    }
}

impl Default for PatternLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(path: &str, ua: &str, body: usize, ts: Timestamp) -> RequestFingerprint {
        RequestFingerprint {
            ip: "1.2.3.4".into(),
            path: path.into(),
            method: "GET".into(),
            user_agent: ua.into(),
            body_size: body,
            timestamp: ts,
        }
    }

    #[test]
    fn suspicious_path_is_flagged() {
        let mut layer = PatternLayer::new();
        let score = layer.score(&fp("/.env", "Mozilla/5.0 real browser", 10, 0));
        assert!(score >= 40.0);
    }

    #[test]
    fn tiny_user_agent_is_flagged() {
        let mut layer = PatternLayer::new();
        let score = layer.score(&fp("/swaps", "ab", 10, 0));
        assert!(score >= 20.0);
    }

    #[test]
    fn clean_request_scores_zero() {
        let mut layer = PatternLayer::new();
        let score = layer.score(&fp("/swaps", "Mozilla/5.0 real browser", 10, 0));
        assert_eq!(score, 0.0);
    }
}
