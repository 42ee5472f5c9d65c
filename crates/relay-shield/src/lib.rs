pub mod defense;
pub mod geo;
pub mod pattern;
pub mod reputation;
pub mod resource;
pub mod score;
pub mod shield;
pub mod types;
pub mod volume;

pub use defense::DefenseLevel;
pub use geo::{GeoLayer, GeoSource, StaticGeoSource};
pub use pattern::PatternLayer;
pub use reputation::{ReputationLayer, ReputationSource, StaticReputationSource};
pub use resource::ResourceLayer;
pub use score::{aggregate, decide, LayerScores};
pub use shield::DdosShield;
pub use types::{Action, Decision, DecisionBucket, ReputationClass, RequestFingerprint};
pub use volume::VolumeLayer;
