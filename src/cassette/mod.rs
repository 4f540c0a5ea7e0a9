//! Cassettes: recorded port interactions for deterministic replay.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;

/// Port name used for clock interactions.
pub const CLOCK_PORT: &str = "clock";
/// Port name used for record store interactions.
pub const STORE_PORT: &str = "store";
