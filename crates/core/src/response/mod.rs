mod batch;
mod cursor;
mod paginated;

pub use batch::{merge_round, BatchResponse};
pub use cursor::{decode_cursor, encode_cursor};
pub use paginated::{merge_page, PaginatedResponse};
