//! In-process record store.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::{prefix_items, scan_page};
use crate::ports::{Item, ItemKey, RecordStore, ScanPage, ScanRequest, StoreError, StoreFuture};

/// Record store holding items in a key-ordered map.
///
/// Conditional inserts check and insert under one write lock, so the
/// no-overwrite guarantee holds across concurrent tasks.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    items: RwLock<BTreeMap<ItemKey, Item>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the item stored under `key`.
    pub async fn get(&self, key: &ItemKey) -> Option<Item> {
        self.items.read().await.get(key).cloned()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether the store holds no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn scan_attribute<'a>(&'a self, request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
        Box::pin(async move { Ok(scan_page(&*self.items.read().await, request)) })
    }

    fn scan_prefix<'a>(&'a self, pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
        Box::pin(async move { Ok(prefix_items(&*self.items.read().await, pk_prefix)) })
    }

    fn put_if_absent<'a>(&'a self, item: &'a Item) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let key = ItemKey::of(item)?;
            let mut items = self.items.write().await;
            if items.contains_key(&key) {
                return Err(StoreError::ConditionFailed { key });
            }
            items.insert(key, item.clone());
            Ok(())
        })
    }
}
