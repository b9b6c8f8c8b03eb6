mod error;
mod kinds;
mod registry;

pub use error::CoercionError;
pub use kinds::{CoerceFn, Codec, Coercion};
pub use registry::CoercerRegistry;
