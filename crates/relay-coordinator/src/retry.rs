use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter: `sleep(uniform(0, min(cap, base * 2^attempt)))`.
pub fn backoff_full_jitter(base_ms: u64, attempt: u32, cap_ms: u64) -> Duration {
    let exp = base_ms.saturating_mul(1u64 << attempt.min(20));
    let capped = exp.min(cap_ms).max(1);
    let jittered = rand::thread_rng().gen_range(0..=capped);
    Duration::from_millis(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_never_exceeds_cap() {
        for attempt in 0..10 {
            let d = backoff_full_jitter(250, attempt, 5_000);
            assert!(d.as_millis() as u64 <= 5_000);
        }
    }

    #[test]
    fn backoff_grows_with_attempt_on_average() {
        let low = backoff_full_jitter(250, 0, 60_000);
        let high_cap = backoff_full_jitter(250, 10, 60_000);
        assert!(low.as_millis() <= 500);
        assert!(high_cap.as_millis() <= 60_000);
    }
}
