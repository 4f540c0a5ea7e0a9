//! Next-id allocation by scanning every stored id of a category.
//!
//! Allocation keeps no state between calls: each call drains a full scan and
//! returns one more than the largest id it saw. Two concurrent calls can
//! return the same id; the conditional insert in
//! [`SiteCreator`](super::SiteCreator) decides which one keeps it.

use serde_json::Value;
use tracing::debug;

use super::category::SiteCategory;
use super::error::SiteError;
use crate::ports::{RecordStore, ScanRequest};

/// Page size used when none is configured.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

/// Allocates numeric site ids from the contents of a record store.
pub struct SiteIdAllocator<'a> {
    store: &'a dyn RecordStore,
    page_size: usize,
}

impl<'a> SiteIdAllocator<'a> {
    /// Creates an allocator scanning `store` with the default page size.
    #[must_use]
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store, page_size: DEFAULT_SCAN_PAGE_SIZE }
    }

    /// Sets the number of items requested per scan page (at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the next unused id for `category`.
    ///
    /// The scan covers every company. Every page is drained before the
    /// maximum is taken.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::AllocationScan`] if any page read fails, or
    /// [`SiteError::IdSpaceExhausted`] if the largest stored id is `u64::MAX`.
    pub async fn next_id(&self, category: SiteCategory) -> Result<u64, SiteError> {
        let mut request = ScanRequest {
            attribute: category.id_attribute().to_string(),
            exclusive_start: None,
            limit: self.page_size,
        };
        let mut highest = 0;
        let mut pages = 0_usize;
        let mut seen = 0_usize;

        loop {
            let page = self
                .store
                .scan_attribute(&request)
                .await
                .map_err(|source| SiteError::AllocationScan { category, source })?;
            pages += 1;
            seen += page.values.len();
            highest = page.values.iter().map(|v| parse_id(v.as_ref())).fold(highest, u64::max);

            match page.last_key {
                Some(key) => request.exclusive_start = Some(key),
                None => break,
            }
        }

        let next = next_after(highest).ok_or(SiteError::IdSpaceExhausted { category })?;
        debug!(%category, pages, items = seen, highest, next, "allocated site id");
        Ok(next)
    }
}

/// Reads a stored id value as an integer.
///
/// Numbers are truncated toward zero. Strings count by their leading digits,
/// so `"12abc"` reads as 12. Anything else, including negatives and values
/// too large for a `u64` in either form, reads as 0.
#[must_use]
pub fn parse_id(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| (0.0..U64_LIMIT).contains(f)).map(truncate))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_leading_digits(s),
        _ => 0,
    }
}

/// Returns the id following the largest one seen, or `None` when that id
/// would not fit in a `u64`.
#[must_use]
pub fn next_id_from<'v>(values: impl IntoIterator<Item = Option<&'v Value>>) -> Option<u64> {
    next_after(values.into_iter().map(parse_id).max().unwrap_or(0))
}

fn next_after(highest: u64) -> Option<u64> {
    highest.checked_add(1)
}

// 2^64, the first float no u64 can hold.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate(f: f64) -> u64 {
    f.trunc() as u64
}

fn parse_leading_digits(s: &str) -> u64 {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapters::memory::MemoryRecordStore;
    use crate::ports::{Item, ScanPage, StoreError, StoreFuture};
    use proptest::prelude::*;
    use serde_json::json;

    fn item(pk: &str, attribute: &str, id: Value) -> Item {
        let mut item = json!({"pk": pk, "sk": "METADATA"}).as_object().cloned().unwrap();
        item.insert(attribute.to_string(), id);
        item
    }

    async fn seeded(items: Vec<Item>) -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        for item in &items {
            store.put_if_absent(item).await.unwrap();
        }
        store
    }

    #[test]
    fn parses_loosely() {
        assert_eq!(parse_id(Some(&json!(7))), 7);
        assert_eq!(parse_id(Some(&json!(7.9))), 7);
        assert_eq!(parse_id(Some(&json!("12"))), 12);
        assert_eq!(parse_id(Some(&json!(" 12abc"))), 12);
        assert_eq!(parse_id(Some(&json!("abc"))), 0);
        assert_eq!(parse_id(Some(&json!(-4))), 0);
        assert_eq!(parse_id(Some(&json!("-4"))), 0);
        assert_eq!(parse_id(Some(&json!(null))), 0);
        assert_eq!(parse_id(Some(&json!({"n": 3}))), 0);
        assert_eq!(parse_id(None), 0);
    }

    #[test]
    fn oversized_ids_read_as_zero_in_both_forms() {
        assert_eq!(parse_id(Some(&json!(1e20))), 0);
        assert_eq!(parse_id(Some(&json!("100000000000000000000"))), 0);
        assert_eq!(parse_id(Some(&json!(f64::MAX))), 0);
        assert_eq!(parse_id(Some(&json!(u64::MAX))), u64::MAX);
    }

    #[test]
    fn empty_input_allocates_one() {
        assert_eq!(next_id_from(std::iter::empty()), Some(1));
    }

    #[test]
    fn largest_id_has_no_successor() {
        let values = [json!(3), json!(u64::MAX)];
        assert_eq!(next_id_from(values.iter().map(Some)), None);
    }

    proptest! {
        #[test]
        fn next_is_max_plus_one(ids in proptest::collection::vec(0_u64..1_000_000, 1..50)) {
            let values: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
            let next = next_id_from(values.iter().map(Some));
            prop_assert_eq!(next, Some(ids.iter().max().unwrap() + 1));
        }

        #[test]
        fn garbage_never_raises_the_max(ids in proptest::collection::vec(0_u64..1000, 0..20)) {
            let mut values: Vec<Value> = ids.iter().map(|id| json!(id)).collect();
            values.push(json!("not a number"));
            values.push(Value::Null);
            let next = next_id_from(values.iter().map(Some).chain([None]));
            prop_assert_eq!(next, Some(ids.iter().max().copied().unwrap_or(0) + 1));
        }
    }

    #[tokio::test]
    async fn production_ids_three_seven_two_allocate_eight() {
        let store = seeded(vec![
            item("ACME_P0003", "productionSiteId", json!(3)),
            item("ACME_P0007", "productionSiteId", json!(7)),
            item("OTHER_P0002", "productionSiteId", json!(2)),
        ])
        .await;
        let allocator = SiteIdAllocator::new(&store);
        assert_eq!(allocator.next_id(SiteCategory::Production).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn categories_are_counted_separately() {
        let store = seeded(vec![
            item("ACME_P0009", "productionSiteId", json!(9)),
            item("ACME_C0002", "consumptionSiteId", json!("2")),
        ])
        .await;
        let allocator = SiteIdAllocator::new(&store);
        assert_eq!(allocator.next_id(SiteCategory::Consumption).await.unwrap(), 3);
        assert_eq!(allocator.next_id(SiteCategory::Production).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn stored_float_beyond_u64_does_not_wedge_allocation() {
        let store = seeded(vec![
            item("ACME_P0004", "productionSiteId", json!(4)),
            item("ACME_P_BIG", "productionSiteId", json!(1e20)),
        ])
        .await;
        let allocator = SiteIdAllocator::new(&store);
        assert_eq!(allocator.next_id(SiteCategory::Production).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn exhausted_id_space_is_an_error() {
        let store = seeded(vec![item("ACME_P_MAX", "productionSiteId", json!(u64::MAX))]).await;
        let allocator = SiteIdAllocator::new(&store);
        let err = allocator.next_id(SiteCategory::Production).await.unwrap_err();
        assert!(matches!(
            err,
            SiteError::IdSpaceExhausted { category: SiteCategory::Production }
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn empty_store_allocates_one() {
        let store = MemoryRecordStore::new();
        let allocator = SiteIdAllocator::new(&store);
        assert_eq!(allocator.next_id(SiteCategory::Consumption).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn drains_every_page() {
        let items = (1..=25)
            .map(|n| item(&format!("ACME_P{n:04}"), "productionSiteId", json!(n)))
            .collect();
        let store = seeded(items).await;

        // The highest id sits on the last page.
        let allocator = SiteIdAllocator::new(&store).with_page_size(4);
        assert_eq!(allocator.next_id(SiteCategory::Production).await.unwrap(), 26);
    }

    struct FailingSecondPage {
        inner: MemoryRecordStore,
        calls: AtomicUsize,
    }

    impl RecordStore for FailingSecondPage {
        fn scan_attribute<'a>(&'a self, request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 1 {
                return Box::pin(async {
                    Err(StoreError::Backend { reason: "provisioned throughput exceeded".into() })
                });
            }
            self.inner.scan_attribute(request)
        }

        fn scan_prefix<'a>(&'a self, pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
            self.inner.scan_prefix(pk_prefix)
        }

        fn put_if_absent<'a>(&'a self, item: &'a Item) -> StoreFuture<'a, ()> {
            self.inner.put_if_absent(item)
        }
    }

    #[tokio::test]
    async fn scan_failure_carries_cause() {
        let inner = seeded(
            (1..=5).map(|n| item(&format!("A_P{n:04}"), "productionSiteId", json!(n))).collect(),
        )
        .await;
        let store = FailingSecondPage { inner, calls: AtomicUsize::new(0) };
        let allocator = SiteIdAllocator::new(&store).with_page_size(2);

        let err = allocator.next_id(SiteCategory::Production).await.unwrap_err();
        match err {
            SiteError::AllocationScan { category, source } => {
                assert_eq!(category, SiteCategory::Production);
                assert!(source.to_string().contains("throughput"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
