//! Clock port used to stamp record timestamps.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Creation timestamps are taken from this port so tests and cassette
/// replay can pin them.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}
