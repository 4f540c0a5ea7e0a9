//! Live adapters backed by the system clock and local files.

pub mod clock;
pub mod table_store;
