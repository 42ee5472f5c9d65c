use std::collections::HashMap;

use relay_core::types::Timestamp;

/// Fixed-capacity token bucket refilled continuously at `rate` tokens/sec.
struct TokenBucket {
    capacity: f64,
    rate_per_sec: f64,
    tokens: f64,
    last_refill: Timestamp,
}

impl TokenBucket {
    fn new(capacity: f64, rate_per_sec: f64, now: Timestamp) -> Self {
        Self {
            capacity,
            rate_per_sec,
            tokens: capacity,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Timestamp) {
        let elapsed = (now - self.last_refill).max(0) as f64;
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Consumes one token if available; returns the fraction of capacity
    /// remaining afterward (used to derive a pressure score).
    fn consume(&mut self, now: Timestamp) -> f64 {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
        }
        self.tokens / self.capacity
    }
}

/// Per-IP and per-path token buckets over a 1-minute and 1-hour window each.
/// The volume score is the worst (most depleted) of the four buckets
/// touched by a request.
pub struct VolumeLayer {
    per_ip_minute: HashMap<String, TokenBucket>,
    per_ip_hour: HashMap<String, TokenBucket>,
    per_path_minute: HashMap<String, TokenBucket>,
    per_path_hour: HashMap<String, TokenBucket>,
    ip_minute_capacity: f64,
    ip_hour_capacity: f64,
    path_minute_capacity: f64,
    path_hour_capacity: f64,
}

impl VolumeLayer {
    pub fn new(ip_minute_capacity: f64, ip_hour_capacity: f64, path_minute_capacity: f64, path_hour_capacity: f64) -> Self {
        Self {
            per_ip_minute: HashMap::new(),
            per_ip_hour: HashMap::new(),
            per_path_minute: HashMap::new(),
            per_path_hour: HashMap::new(),
            ip_minute_capacity,
            ip_hour_capacity,
            path_minute_capacity,
            path_hour_capacity,
        }
    }

    /// 60 req/min and 1000 req/hr per IP; 600 req/min and 20000 req/hr per path.
    pub fn default_limits() -> Self {
        Self::new(60.0, 1_000.0, 600.0, 20_000.0)
    }

    /// Lower remaining fraction ⇒ higher pressure score (0-100).
    pub fn score(&mut self, ip: &str, path: &str, now: Timestamp) -> f64 {
        let ip_min = self
            .per_ip_minute
            .entry(ip.to_string())
            .or_insert_with(|| TokenBucket::new(self.ip_minute_capacity, self.ip_minute_capacity / 60.0, now))
            .consume(now);
        let ip_hr = self
            .per_ip_hour
            .entry(ip.to_string())
            .or_insert_with(|| TokenBucket::new(self.ip_hour_capacity, self.ip_hour_capacity / 3_600.0, now))
            .consume(now);
        let path_min = self
            .per_path_minute
            .entry(path.to_string())
            .or_insert_with(|| TokenBucket::new(self.path_minute_capacity, self.path_minute_capacity / 60.0, now))
            .consume(now);
        let path_hr = self
            .per_path_hour
            .entry(path.to_string())
            .or_insert_with(|| TokenBucket::new(self.path_hour_capacity, self.path_hour_capacity / 3_600.0, now))
            .consume(now);

        let remaining = ip_min.min(ip_hr).min(path_min).min(path_hr);
        ((1.0 - remaining) * 100.0).clamp(0.0, 100.0)
    }
}
