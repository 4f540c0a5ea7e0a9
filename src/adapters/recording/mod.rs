//! Recording adapters: delegate to an inner port and capture each call.

pub mod clock;
pub mod record_store;

pub use clock::RecordingClock;
pub use record_store::RecordingRecordStore;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::format::RecordedStoreError;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::StoreError;

/// Records a call whose return value cannot fail.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize + ?Sized,
    O: Serialize + ?Sized,
{
    let input = serde_json::to_value(input).expect("failed to serialize recording input");
    let output = serde_json::to_value(output).expect("failed to serialize recording output");
    recorder.lock().expect("recorder lock poisoned").record(port, method, input, output);
}

/// Records a store call as `{"ok": value}` or `{"err": RecordedStoreError}`.
///
/// Mirror of `replaying::replay_result`.
pub(crate) fn record_result<I, T>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, StoreError>,
) where
    I: Serialize + ?Sized,
    T: Serialize,
{
    let output = match result {
        Ok(value) => serde_json::json!({ "ok": value }),
        Err(err) => serde_json::json!({ "err": RecordedStoreError::from(err) }),
    };
    record_interaction(recorder, port, method, input, &output);
}
