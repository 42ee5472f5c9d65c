pub mod hash;
pub mod secret;

pub use hash::{hash_preimage, verify_preimage};
pub use secret::generate_secret;
