mod attribute;
mod marshal;
mod types;

pub use attribute::{AttributeValue, Item};
pub use marshal::{from_attribute_value, parse_number, to_attribute_value};
pub use types::{Record, Value};
