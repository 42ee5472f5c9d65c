use relay_core::constants::{
    SHIELD_BLOCK_SECS, SHIELD_DELAY_MAX_SECS, SHIELD_EMERGENCY_BLOCK_SECS, SHIELD_THRESHOLD_CRITICAL,
    SHIELD_THRESHOLD_HIGH, SHIELD_THRESHOLD_LOW, SHIELD_THRESHOLD_MEDIUM, SHIELD_WEIGHT_GEO,
    SHIELD_WEIGHT_PATTERN, SHIELD_WEIGHT_REPUTATION, SHIELD_WEIGHT_RESOURCE, SHIELD_WEIGHT_VOLUME,
};

use crate::types::{Action, Decision, DecisionBucket};

pub struct LayerScores {
    pub volume: f64,
    pub pattern: f64,
    pub reputation: f64,
    pub resource: f64,
    pub geo: f64,
}

/// `S = 0.30*V + 0.25*P + 0.20*R + 0.15*Res + 0.10*Geo`, scaled by
/// `defenseLevel` (level 1 = no amplification, level 5 = maximum).
pub fn aggregate(scores: &LayerScores, defense_level: u8) -> f64 {
    let raw = SHIELD_WEIGHT_VOLUME * scores.volume
        + SHIELD_WEIGHT_PATTERN * scores.pattern
        + SHIELD_WEIGHT_REPUTATION * scores.reputation
        + SHIELD_WEIGHT_RESOURCE * scores.resource
        + SHIELD_WEIGHT_GEO * scores.geo;
    let amplification = 1.0 + (defense_level.clamp(1, 5) as f64 - 1.0) * 0.1;
    (raw * amplification).min(100.0)
}

pub fn decide(score: f64) -> Decision {
    let (bucket, action) = if score >= SHIELD_THRESHOLD_CRITICAL {
        (
            DecisionBucket::Critical,
            Action::EmergencyBlock {
                secs: SHIELD_EMERGENCY_BLOCK_SECS,
            },
        )
    } else if score >= SHIELD_THRESHOLD_HIGH {
        (DecisionBucket::High, Action::Block { secs: SHIELD_BLOCK_SECS })
    } else if score >= SHIELD_THRESHOLD_MEDIUM {
        let delay_secs = (SHIELD_DELAY_MAX_SECS as f64
            * ((score - SHIELD_THRESHOLD_MEDIUM) / (SHIELD_THRESHOLD_HIGH - SHIELD_THRESHOLD_MEDIUM)))
            .round() as u64;
        (DecisionBucket::Medium, Action::Delay { secs: delay_secs.min(SHIELD_DELAY_MAX_SECS) })
    } else if score >= SHIELD_THRESHOLD_LOW {
        (DecisionBucket::Low, Action::RateLimit)
    } else {
        (DecisionBucket::None, Action::Allow)
    };
    Decision { bucket, action, score }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(v: f64) -> LayerScores {
        LayerScores {
            volume: v,
            pattern: 0.0,
            reputation: 0.0,
            resource: 0.0,
            geo: 0.0,
        }
    }

    #[test]
    fn decision_buckets_match_thresholds() {
        assert_eq!(decide(10.0).bucket, DecisionBucket::None);
        assert_eq!(decide(25.0).bucket, DecisionBucket::Low);
        assert_eq!(decide(45.0).bucket, DecisionBucket::Medium);
        assert_eq!(decide(65.0).bucket, DecisionBucket::High);
        assert_eq!(decide(85.0).bucket, DecisionBucket::Critical);
    }

    #[test]
    fn higher_defense_level_amplifies_score() {
        let s = scores(50.0);
        let level1 = aggregate(&s, 1);
        let level5 = aggregate(&s, 5);
        assert!(level5 > level1);
    }
}
