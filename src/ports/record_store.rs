//! Record store port: a key-value table addressed by `(pk, sk)`.
//!
//! The shape follows a DynamoDB-style table. Items are JSON objects that
//! carry their own key attributes, scans are paginated, and the only write
//! the site core needs is a conditional insert.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Attribute holding the partition (primary) key of an item.
pub const PARTITION_KEY_ATTR: &str = "pk";
/// Attribute holding the sort key of an item.
pub const SORT_KEY_ATTR: &str = "sk";

/// A stored item: a flat JSON object of attributes.
pub type Item = Map<String, Value>;

/// Boxed future returned by [`RecordStore`] methods so the trait stays dyn-compatible.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Composite key identifying one item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
}

impl ItemKey {
    /// Builds a key from its two parts.
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self { pk: pk.into(), sk: sk.into() }
    }

    /// Reads the key attributes out of an item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingKey`] if either key attribute is absent
    /// or not a string.
    pub fn of(item: &Item) -> Result<Self, StoreError> {
        let read = |attribute: &'static str| {
            item.get(attribute)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(StoreError::MissingKey { attribute })
        };
        Ok(Self { pk: read(PARTITION_KEY_ATTR)?, sk: read(SORT_KEY_ATTR)? })
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

/// Request for one page of a projected scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Attribute to project from each item.
    pub attribute: String,
    /// Resume after this key; `None` starts from the beginning.
    pub exclusive_start: Option<ItemKey>,
    /// Maximum number of items examined in this page.
    pub limit: usize,
}

/// Result of one scan page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanPage {
    /// Projected value per examined item; `None` when the item lacks the attribute.
    pub values: Vec<Option<Value>>,
    /// Key to resume from. `Some` while more items may remain.
    pub last_key: Option<ItemKey>,
}

/// Errors raised by record store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional insert found an existing item under the same key.
    #[error("conditional write rejected: item {key} already exists")]
    ConditionFailed {
        /// Key that already exists.
        key: ItemKey,
    },

    /// An item was handed to the store without its key attributes.
    #[error("item is missing key attribute `{attribute}`")]
    MissingKey {
        /// Missing attribute name.
        attribute: &'static str,
    },

    /// Underlying I/O failure.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("store data could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Any other backend failure, described by the backend.
    #[error("store backend error: {reason}")]
    Backend {
        /// Backend-provided description.
        reason: String,
    },
}

impl StoreError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConditionFailed { .. } => "condition_failed",
            Self::MissingKey { .. } => "missing_key",
            Self::Io(_) => "io",
            Self::Encoding(_) => "encoding",
            Self::Backend { .. } => "backend",
        }
    }
}

/// Key-value table holding site items.
pub trait RecordStore: Send + Sync {
    /// Scans one page of items, projecting a single attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn scan_attribute<'a>(&'a self, request: &'a ScanRequest) -> StoreFuture<'a, ScanPage>;

    /// Returns every item whose partition key starts with `pk_prefix`,
    /// ordered by key. Adapters drain their own pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn scan_prefix<'a>(&'a self, pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>>;

    /// Inserts `item` only if no item with the same `(pk, sk)` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionFailed`] when the key is taken, or
    /// another [`StoreError`] when the write itself fails.
    fn put_if_absent<'a>(&'a self, item: &'a Item) -> StoreFuture<'a, ()>;
}
