pub mod sweep;

pub use sweep::{RecoveryConfig, RecoverySweeper};
