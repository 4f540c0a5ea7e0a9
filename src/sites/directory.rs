//! Listing a company's sites.

use tracing::debug;

use super::category::SiteCategory;
use super::error::SiteError;
use super::key::{company_prefix, SiteKey, METADATA_SORT_KEY};
use super::record::SiteRecord;
use crate::ports::record_store::{ItemKey, SORT_KEY_ATTR};
use crate::ports::RecordStore;

/// Read-side access to stored sites.
pub struct SiteDirectory<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> SiteDirectory<'a> {
    /// Creates a directory over `store`.
    #[must_use]
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Returns the root records of `company_id`'s sites in `category`,
    /// ordered by numeric id.
    ///
    /// Only items whose key parses back to exactly this company and
    /// category are returned, so a company named `ACME_PLANT` never shows
    /// up under `ACME`.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::ListScan`] if the store read fails, or
    /// [`SiteError::MalformedRecord`] if a matching item cannot be read.
    pub async fn get_sites(
        &self,
        company_id: &str,
        category: SiteCategory,
    ) -> Result<Vec<SiteRecord>, SiteError> {
        let prefix = company_prefix(company_id, category);
        let items = self
            .store
            .scan_prefix(&prefix)
            .await
            .map_err(|source| SiteError::ListScan {
                company_id: company_id.to_string(),
                category,
                source,
            })?;
        let scanned = items.len();

        let mut sites = Vec::new();
        for item in items {
            if item.get(SORT_KEY_ATTR).and_then(|v| v.as_str()) != Some(METADATA_SORT_KEY) {
                continue;
            }
            let Ok(key) = ItemKey::of(&item) else { continue };
            match SiteKey::parse(&key.pk) {
                Some(parsed) if parsed.company_id == company_id && parsed.category == category => {
                    sites.push(SiteRecord::from_item(item)?);
                }
                _ => {}
            }
        }
        sites.sort_by_key(|site| site.numeric_id);

        debug!(company_id, %category, scanned, returned = sites.len(), "listed sites");
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::adapters::memory::MemoryRecordStore;

    async fn put_site(store: &MemoryRecordStore, company: &str, category: SiteCategory, id: u64) {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let record = SiteRecord::assemble(&SiteKey::new(company, category, id), Map::new(), now);
        store.put_if_absent(&record.to_item()).await.unwrap();
    }

    #[tokio::test]
    async fn lists_only_the_requested_company_and_category() {
        let store = MemoryRecordStore::new();
        put_site(&store, "ACME", SiteCategory::Production, 10).await;
        put_site(&store, "ACME", SiteCategory::Production, 2).await;
        put_site(&store, "ACME", SiteCategory::Consumption, 3).await;
        put_site(&store, "ACME_PLANT", SiteCategory::Consumption, 4).await;
        put_site(&store, "OTHER", SiteCategory::Production, 5).await;

        let directory = SiteDirectory::new(&store);
        let sites = directory.get_sites("ACME", SiteCategory::Production).await.unwrap();
        let keys: Vec<_> = sites.iter().map(|s| s.primary_key.as_str()).collect();
        assert_eq!(keys, ["ACME_P0002", "ACME_P0010"]);
    }

    #[tokio::test]
    async fn skips_non_root_items() {
        let store = MemoryRecordStore::new();
        put_site(&store, "ACME", SiteCategory::Production, 1).await;
        let child: Value = json!({"pk": "ACME_P0001", "sk": "READING#2025-01"});
        store.put_if_absent(child.as_object().unwrap()).await.unwrap();

        let sites = SiteDirectory::new(&store)
            .get_sites("ACME", SiteCategory::Production)
            .await
            .unwrap();
        assert_eq!(sites.len(), 1);
    }

    #[tokio::test]
    async fn empty_company_lists_nothing() {
        let store = MemoryRecordStore::new();
        let sites = SiteDirectory::new(&store)
            .get_sites("NOBODY", SiteCategory::Consumption)
            .await
            .unwrap();
        assert!(sites.is_empty());
    }
}
