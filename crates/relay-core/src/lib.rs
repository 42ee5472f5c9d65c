pub mod constants;
pub mod error;
pub mod types;
pub mod validate;

pub use constants::*;
pub use error::{ErrorCode, RelayError};
pub use types::*;
