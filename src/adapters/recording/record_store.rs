//! Record store wrapper that records every call and its outcome.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::STORE_PORT;
use crate::ports::{Item, RecordStore, ScanPage, ScanRequest, StoreFuture};

/// Records store calls while delegating to an inner store.
pub struct RecordingRecordStore {
    inner: Box<dyn RecordStore>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingRecordStore {
    /// Wraps `inner`, appending calls to `recorder`.
    pub fn new(inner: Box<dyn RecordStore>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl RecordStore for RecordingRecordStore {
    fn scan_attribute<'a>(&'a self, request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
        Box::pin(async move {
            let result = self.inner.scan_attribute(request).await;
            record_result(&self.recorder, STORE_PORT, "scan_attribute", request, &result);
            result
        })
    }

    fn scan_prefix<'a>(&'a self, pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
        Box::pin(async move {
            let result = self.inner.scan_prefix(pk_prefix).await;
            record_result(
                &self.recorder,
                STORE_PORT,
                "scan_prefix",
                &json!({ "pk_prefix": pk_prefix }),
                &result,
            );
            result
        })
    }

    fn put_if_absent<'a>(&'a self, item: &'a Item) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.put_if_absent(item).await;
            record_result(&self.recorder, STORE_PORT, "put_if_absent", item, &result);
            result
        })
    }
}
