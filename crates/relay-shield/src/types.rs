use relay_core::types::Timestamp;

/// Everything the shield knows about one inbound request.
#[derive(Clone, Debug)]
pub struct RequestFingerprint {
    pub ip: String,
    pub path: String,
    pub method: String,
    pub user_agent: String,
    pub body_size: usize,
    pub timestamp: Timestamp,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReputationClass {
    Good,
    Neutral,
    Suspicious,
    Malicious,
}

impl ReputationClass {
    /// Base score contribution, scaled 0-100.
    pub fn score(&self) -> f64 {
        match self {
            ReputationClass::Good => 0.0,
            ReputationClass::Neutral => 20.0,
            ReputationClass::Suspicious => 60.0,
            ReputationClass::Malicious => 100.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecisionBucket {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Allow,
    RateLimit,
    Delay { secs: u64 },
    Block { secs: i64 },
    EmergencyBlock { secs: i64 },
}

#[derive(Clone, Debug)]
pub struct Decision {
    pub bucket: DecisionBucket,
    pub action: Action,
    pub score: f64,
}
