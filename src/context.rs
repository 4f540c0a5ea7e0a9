//! Service context bundling the port trait objects.

use std::path::Path;

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::table_store::JsonTableStore;
use crate::adapters::memory::MemoryRecordStore;
use crate::adapters::recording::{RecordingClock, RecordingRecordStore};
use crate::adapters::replaying::{ReplayingClock, ReplayingRecordStore};
use crate::cassette::config::CassetteConfig;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::Config;
use crate::ports::{Clock, Item, RecordStore, ScanPage, ScanRequest, StoreFuture};
use crate::sites::allocator::DEFAULT_SCAN_PAGE_SIZE;

/// The ports a site operation runs against.
///
/// Constructors wire live, in-memory, recording or replaying adapters;
/// the site core never builds its own.
pub struct ServiceContext {
    /// Time source for record timestamps.
    pub clock: Box<dyn Clock>,
    /// Table holding site items.
    pub store: Box<dyn RecordStore>,
    /// Page size for allocation scans.
    pub scan_page_size: usize,
}

impl ServiceContext {
    /// Live context: system clock and the JSON table named by `config`.
    #[must_use]
    pub fn live(config: &Config) -> Self {
        Self {
            clock: Box::new(LiveClock),
            store: Box::new(JsonTableStore::new(&config.store_path)),
            scan_page_size: config.scan_page_size,
        }
    }

    /// System clock over an empty in-memory table.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            clock: Box::new(LiveClock),
            store: Box::new(MemoryRecordStore::new()),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Live context whose port calls are recorded into a new session
    /// under `base_dir`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        config: &Config,
        base_dir: &Path,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base_dir)?;
        let live = Self::live(config);
        let ctx = Self {
            clock: Box::new(RecordingClock::new(live.clock, session.clock.clone())),
            store: Box::new(RecordingRecordStore::new(live.store, session.store.clone())),
            scan_page_size: live.scan_page_size,
        };
        Ok((ctx, session))
    }

    /// Replays every port from one cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = CassetteConfig::load_cassette(path)?;
        Ok(Self {
            clock: Box::new(ReplayingClock::new(CassetteReplayer::new(&cassette))),
            store: Box::new(ReplayingRecordStore::new(CassetteReplayer::new(&cassette))),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        })
    }

    /// Replays each port from its own cassette; unconfigured ports panic
    /// when called.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured cassette cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig) -> Result<Self, String> {
        let replayers = config.load_all()?;
        Ok(Self {
            clock: match replayers.clock {
                Some(r) => Box::new(ReplayingClock::new(r)),
                None => Box::new(PanickingClock),
            },
            store: match replayers.store {
                Some(r) => Box::new(ReplayingRecordStore::new(r)),
                None => Box::new(PanickingRecordStore),
            },
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        })
    }

    /// Overrides the allocation scan page size.
    #[must_use]
    pub fn with_scan_page_size(mut self, page_size: usize) -> Self {
        self.scan_page_size = page_size.max(1);
        self
    }
}

// --- Panicking adapters for ports without a cassette ---

struct PanickingClock;
impl Clock for PanickingClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        panic!("Clock port not configured in CassetteConfig: no cassette loaded for clock");
    }
}

struct PanickingRecordStore;
impl PanickingRecordStore {
    fn unconfigured() -> ! {
        panic!("RecordStore port not configured in CassetteConfig: no cassette loaded for store");
    }
}
impl RecordStore for PanickingRecordStore {
    fn scan_attribute<'a>(&'a self, _request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
        Self::unconfigured()
    }
    fn scan_prefix<'a>(&'a self, _pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
        Self::unconfigured()
    }
    fn put_if_absent<'a>(&'a self, _item: &'a Item) -> StoreFuture<'a, ()> {
        Self::unconfigured()
    }
}
