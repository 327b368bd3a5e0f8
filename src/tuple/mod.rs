pub mod cursor;
pub mod record;
pub mod schema;

pub use record::{Record, Rid, Value, TOMBSTONE_DEAD, TOMBSTONE_LIVE};
pub use schema::{Attribute, DataType, Schema, ATTR_NAME_MAX_LEN};
