//! Record store answered from a cassette.

use std::sync::Mutex;

use super::replay_result;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::STORE_PORT;
use crate::ports::{Item, RecordStore, ScanPage, ScanRequest, StoreError, StoreFuture};

/// Serves recorded store results in call order.
///
/// Inputs are not compared against the recording; the replay only
/// reproduces what the store answered.
pub struct ReplayingRecordStore {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingRecordStore {
    /// Creates a store reading from `replayer`.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T, StoreError> {
        let output = self
            .replayer
            .lock()
            .expect("replayer lock poisoned")
            .next_interaction(STORE_PORT, method)
            .output;
        replay_result(output, &format!("store::{method}"))
    }
}

impl RecordStore for ReplayingRecordStore {
    fn scan_attribute<'a>(&'a self, _request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
        let result = self.next("scan_attribute");
        Box::pin(async move { result })
    }

    fn scan_prefix<'a>(&'a self, _pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
        let result = self.next("scan_prefix");
        Box::pin(async move { result })
    }

    fn put_if_absent<'a>(&'a self, _item: &'a Item) -> StoreFuture<'a, ()> {
        let result = self.next("put_if_absent");
        Box::pin(async move { result })
    }
}
