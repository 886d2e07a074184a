//! Strategy implementations
//!
//! Contains LogStrategy and BulkJsonStrategy.

mod bulk_json;
mod log;

pub use self::bulk_json::BulkJsonStrategy;
pub use self::log::LogStrategy;
