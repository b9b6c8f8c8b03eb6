mod error;
mod normalize;

pub use error::ValidationError;
pub use normalize::{dedupe_keys, normalize_key, KeyInput};
