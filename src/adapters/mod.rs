//! Adapter implementations of the port traits.
//!
//! - `live`: the system clock and a JSON-file table.
//! - `memory`: an in-process table.
//! - `recording`: wrappers that capture every port call into a cassette.
//! - `replaying`: ports served from a recorded cassette.

pub mod live;
pub mod memory;
pub mod recording;
pub mod replaying;

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::ports::{Item, ItemKey, ScanPage, ScanRequest};

/// Serves one scan page from a key-ordered table.
pub(crate) fn scan_page(items: &BTreeMap<ItemKey, Item>, request: &ScanRequest) -> ScanPage {
    let start = match &request.exclusive_start {
        Some(key) => Bound::Excluded(key),
        None => Bound::Unbounded,
    };
    let limit = request.limit.max(1);
    let mut range = items.range::<ItemKey, _>((start, Bound::Unbounded)).peekable();

    let mut values = Vec::new();
    let mut last = None;
    while values.len() < limit {
        let Some((key, item)) = range.next() else { break };
        values.push(item.get(&request.attribute).cloned());
        last = Some(key);
    }

    let last_key = if range.peek().is_some() { last.cloned() } else { None };
    ScanPage { values, last_key }
}

/// Collects every item whose partition key starts with `pk_prefix`.
pub(crate) fn prefix_items(items: &BTreeMap<ItemKey, Item>, pk_prefix: &str) -> Vec<Item> {
    let start = ItemKey::new(pk_prefix, "");
    items
        .range(start..)
        .take_while(|(key, _)| key.pk.starts_with(pk_prefix))
        .map(|(_, item)| item.clone())
        .collect()
}
