use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Process-wide counters and gauges (C9).
///
/// No external metrics crate is pulled in — every field is a plain atomic,
/// incremented inline by the component that owns the event, and rendered to
/// Prometheus text exposition format by `render_prometheus` for the API's
/// `/metrics` handler. Counters only ever go up; gauges are set to the
/// latest known value.
#[derive(Default)]
pub struct Metrics {
    // ── Swap lifecycle (C5) ──────────────────────────────────────────────────
    pub swaps_created_total: AtomicU64,
    pub swaps_completed_total: AtomicU64,
    pub swaps_failed_total: AtomicU64,
    pub swaps_refunded_total: AtomicU64,
    pub swaps_active: AtomicI64,

    // ── HTLC adapter operations (C6) ─────────────────────────────────────────
    pub htlc_locks_total: AtomicU64,
    pub htlc_withdrawals_total: AtomicU64,
    pub htlc_refunds_total: AtomicU64,
    pub htlc_op_failures_total: AtomicU64,

    // ── Recovery sweeps (C7) ─────────────────────────────────────────────────
    pub recovery_sweeps_total: AtomicU64,
    pub recovery_swaps_driven_total: AtomicU64,

    // ── DDoS shield decisions (C8) ───────────────────────────────────────────
    pub shield_requests_total: AtomicU64,
    pub shield_allowed_total: AtomicU64,
    pub shield_rate_limited_total: AtomicU64,
    pub shield_delayed_total: AtomicU64,
    pub shield_blocked_total: AtomicU64,
    pub shield_emergency_blocked_total: AtomicU64,
    pub shield_defense_level: AtomicI64,

    // ── Connection pool (C1) ─────────────────────────────────────────────────
    pub pool_circuits_open: AtomicI64,
    pub pool_requests_total: AtomicU64,
    pub pool_requests_failed_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_swaps_created(&self) {
        self.swaps_created_total.fetch_add(1, Ordering::Relaxed);
        self.swaps_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_swaps_completed(&self) {
        self.swaps_completed_total.fetch_add(1, Ordering::Relaxed);
        self.swaps_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_swaps_failed(&self) {
        self.swaps_failed_total.fetch_add(1, Ordering::Relaxed);
        self.swaps_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_swaps_refunded(&self) {
        self.swaps_refunded_total.fetch_add(1, Ordering::Relaxed);
        self.swaps_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn inc_htlc_lock(&self) {
        self.htlc_locks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_htlc_withdrawal(&self) {
        self.htlc_withdrawals_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_htlc_refund(&self) {
        self.htlc_refunds_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_htlc_failure(&self) {
        self.htlc_op_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recovery_sweep(&self, driven: u64) {
        self.recovery_sweeps_total.fetch_add(1, Ordering::Relaxed);
        self.recovery_swaps_driven_total
            .fetch_add(driven, Ordering::Relaxed);
    }

    pub fn set_defense_level(&self, level: u8) {
        self.shield_defense_level
            .store(level as i64, Ordering::Relaxed);
    }

    pub fn set_pool_circuits_open(&self, count: i64) {
        self.pool_circuits_open.store(count, Ordering::Relaxed);
    }

    pub fn inc_pool_request(&self, failed: bool) {
        self.pool_requests_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.pool_requests_failed_total
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Renders all counters/gauges in Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        let counter = |out: &mut String, name: &str, help: &str, value: u64| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} counter\n"));
            out.push_str(&format!("{name} {value}\n"));
        };
        let gauge = |out: &mut String, name: &str, help: &str, value: i64| {
            out.push_str(&format!("# HELP {name} {help}\n"));
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{name} {value}\n"));
        };

        counter(
            &mut out,
            "relay_swaps_created_total",
            "Swaps accepted by the control API.",
            self.swaps_created_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_swaps_completed_total",
            "Swaps that reached the Completed terminal status.",
            self.swaps_completed_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_swaps_failed_total",
            "Swaps that reached the Failed terminal status.",
            self.swaps_failed_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_swaps_refunded_total",
            "Swaps that reached the Refunded terminal status.",
            self.swaps_refunded_total.load(Ordering::Relaxed),
        );
        gauge(
            &mut out,
            "relay_swaps_active",
            "Swaps currently in a non-terminal status.",
            self.swaps_active.load(Ordering::Relaxed),
        );

        counter(
            &mut out,
            "relay_htlc_locks_total",
            "HTLC lock transactions submitted.",
            self.htlc_locks_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_htlc_withdrawals_total",
            "HTLC withdrawal transactions submitted.",
            self.htlc_withdrawals_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_htlc_refunds_total",
            "HTLC refund transactions submitted.",
            self.htlc_refunds_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_htlc_op_failures_total",
            "HTLC adapter operations that returned an error.",
            self.htlc_op_failures_total.load(Ordering::Relaxed),
        );

        counter(
            &mut out,
            "relay_recovery_sweeps_total",
            "Recovery sweep passes executed.",
            self.recovery_sweeps_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_recovery_swaps_driven_total",
            "Swaps re-driven by a recovery sweep.",
            self.recovery_swaps_driven_total.load(Ordering::Relaxed),
        );

        counter(
            &mut out,
            "relay_shield_requests_total",
            "Requests evaluated by the DDoS shield.",
            self.shield_requests_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_shield_allowed_total",
            "Requests allowed by the DDoS shield.",
            self.shield_allowed_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_shield_rate_limited_total",
            "Requests rate-limited by the DDoS shield.",
            self.shield_rate_limited_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_shield_delayed_total",
            "Requests delayed by the DDoS shield.",
            self.shield_delayed_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_shield_blocked_total",
            "Requests blocked by the DDoS shield.",
            self.shield_blocked_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_shield_emergency_blocked_total",
            "Requests rejected while the shield was in emergency-stop.",
            self.shield_emergency_blocked_total.load(Ordering::Relaxed),
        );
        gauge(
            &mut out,
            "relay_shield_defense_level",
            "Current adaptive defense level (1-5).",
            self.shield_defense_level.load(Ordering::Relaxed),
        );

        gauge(
            &mut out,
            "relay_pool_circuits_open",
            "Pool member circuit breakers currently Open.",
            self.pool_circuits_open.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_pool_requests_total",
            "Requests issued through a connection pool lease.",
            self.pool_requests_total.load(Ordering::Relaxed),
        );
        counter(
            &mut out,
            "relay_pool_requests_failed_total",
            "Requests issued through a connection pool lease that failed.",
            self.pool_requests_failed_total.load(Ordering::Relaxed),
        );

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = Metrics::new();
        assert_eq!(m.swaps_created_total.load(Ordering::Relaxed), 0);
        assert_eq!(m.swaps_active.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn swap_lifecycle_updates_active_gauge() {
        let m = Metrics::new();
        m.inc_swaps_created();
        m.inc_swaps_created();
        assert_eq!(m.swaps_active.load(Ordering::Relaxed), 2);
        m.inc_swaps_completed();
        assert_eq!(m.swaps_active.load(Ordering::Relaxed), 1);
        assert_eq!(m.swaps_completed_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn render_includes_help_and_type_lines_for_every_metric() {
        let m = Metrics::new();
        m.inc_swaps_created();
        let text = m.render_prometheus();
        assert!(text.contains("# HELP relay_swaps_created_total"));
        assert!(text.contains("# TYPE relay_swaps_created_total counter"));
        assert!(text.contains("relay_swaps_created_total 1\n"));
        assert!(text.contains("# TYPE relay_swaps_active gauge"));
    }
}
