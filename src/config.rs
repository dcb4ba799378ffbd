//! Configuration loaded from files and flag values.

mod duration;
mod table;

pub use duration::parse_duration;
pub use table::{TableConfig, DEFAULT_CRATE_SCHEMA};
