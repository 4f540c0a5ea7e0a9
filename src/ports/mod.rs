//! Port traits defining external boundaries.
//!
//! The site core only ever talks to time and to the record store through
//! these traits. Implementations live in `src/adapters/`.

pub mod clock;
pub mod record_store;

pub use clock::Clock;
pub use record_store::{
    Item, ItemKey, RecordStore, ScanPage, ScanRequest, StoreError, StoreFuture,
};
