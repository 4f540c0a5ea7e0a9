//! Clock answered from a cassette.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::CLOCK_PORT;
use crate::ports::clock::Clock;

/// Serves recorded clock readings in order.
pub struct ReplayingClock {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingClock {
    /// Creates a clock reading from `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl Clock for ReplayingClock {
    fn now(&self) -> DateTime<Utc> {
        let output = self
            .replayer
            .lock()
            .expect("replayer lock poisoned")
            .next_interaction(CLOCK_PORT, "now")
            .output;
        serde_json::from_value(output).expect("clock::now: recorded value is not a timestamp")
    }
}
