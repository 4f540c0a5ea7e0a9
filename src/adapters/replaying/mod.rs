//! Replaying adapters: ports answered from a recorded cassette.

pub mod clock;
pub mod record_store;

pub use clock::ReplayingClock;
pub use record_store::ReplayingRecordStore;

use serde::de::DeserializeOwned;

use crate::cassette::format::RecordedStoreError;
use crate::ports::StoreError;

/// Decodes a `{"ok": value}` / `{"err": RecordedStoreError}` output.
///
/// Mirror of `recording::record_result`.
///
/// # Panics
///
/// Panics if the output matches neither shape; a malformed cassette is a
/// broken fixture, not a store failure.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
    context: &str,
) -> Result<T, StoreError> {
    if let Some(err) = output.get("err") {
        let recorded: RecordedStoreError = serde_json::from_value(err.clone())
            .unwrap_or_else(|e| panic!("{context}: malformed recorded error: {e}"));
        return Err(recorded.into());
    }
    let value = output
        .get("ok")
        .cloned()
        .unwrap_or_else(|| panic!("{context}: expected an `ok` or `err` output"));
    Ok(serde_json::from_value(value)
        .unwrap_or_else(|e| panic!("{context}: failed to deserialize recorded value: {e}")))
}
