use std::sync::atomic::{AtomicU32, Ordering};

/// Tracks system stress as a 0.0-1.0 fraction (CPU, memory, connection-count
/// headroom, however the caller chooses to combine them) and converts it to
/// a 0-100 penalty. Stress is reported by the caller, not sampled here — the
/// actual OS/process metrics source is out of scope.
pub struct ResourceLayer {
    stress_pct: AtomicU32,
    threshold_pct: u32,
}

impl ResourceLayer {
    pub fn new(threshold_fraction: f64) -> Self {
        Self {
            stress_pct: AtomicU32::new(0),
            threshold_pct: (threshold_fraction.clamp(0.0, 1.0) * 100.0) as u32,
        }
    }

    pub fn report_stress(&self, fraction: f64) {
        let pct = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
        self.stress_pct.store(pct, Ordering::SeqCst);
    }

    /// No penalty below the configured threshold; above it, scales linearly
    /// to 100 at full stress.
    pub fn score(&self) -> f64 {
        let pct = self.stress_pct.load(Ordering::SeqCst) as f64;
        let threshold = self.threshold_pct as f64;
        if pct <= threshold {
            return 0.0;
        }
        ((pct - threshold) / (100.0 - threshold).max(1.0) * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_below_threshold_scores_zero() {
        let layer = ResourceLayer::new(0.8);
        layer.report_stress(0.5);
        assert_eq!(layer.score(), 0.0);
    }

    #[test]
    fn full_stress_scores_max() {
        let layer = ResourceLayer::new(0.8);
        layer.report_stress(1.0);
        assert_eq!(layer.score(), 100.0);
    }
}
