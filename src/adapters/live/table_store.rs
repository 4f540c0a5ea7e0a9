//! Record store persisted as a single JSON file.
//!
//! The file holds a JSON array of items ordered by `(pk, sk)`. Writers hold a
//! lease on a sidecar `<path>.lock` file, created with `create_new`, for the
//! whole load-check-save cycle, so separate processes sharing the table
//! serialise their conditional inserts. The new table is written to a unique
//! temp file in the same directory and renamed over the original; readers
//! therefore always see a complete table and take no lease.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{trace, warn};

use crate::adapters::{prefix_items, scan_page};
use crate::ports::{Item, ItemKey, RecordStore, ScanPage, ScanRequest, StoreError, StoreFuture};

/// How long a writer waits for another writer's lease before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// File-backed table used by the CLI.
#[derive(Debug)]
pub struct JsonTableStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl JsonTableStore {
    /// Opens the table at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = OsString::from(path.as_os_str());
        lock_path.push(".lock");
        Self { path, lock_path: PathBuf::from(lock_path), lock_timeout: DEFAULT_LOCK_TIMEOUT }
    }

    /// Overrides how long writes wait for the table lease.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Location of the table file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the writer lease file.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn dir(&self) -> &Path {
        self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."))
    }

    async fn load(&self) -> Result<BTreeMap<ItemKey, Item>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let items: Vec<Item> = serde_json::from_str(&raw)?;
        let mut table = BTreeMap::new();
        for item in items {
            table.insert(ItemKey::of(&item)?, item);
        }
        trace!(path = %self.path.display(), items = table.len(), "loaded table");
        Ok(table)
    }

    fn save(&self, table: &BTreeMap<ItemKey, Item>) -> Result<(), StoreError> {
        let items: Vec<Value> = table.values().cloned().map(Value::Object).collect();
        let json = serde_json::to_vec_pretty(&items)?;

        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    async fn acquire_lease(&self) -> Result<TableLease, StoreError> {
        let started = Instant::now();
        loop {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
                .await
            {
                Ok(_) => return Ok(TableLease { path: self.lock_path.clone() }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if started.elapsed() >= self.lock_timeout {
                        return Err(StoreError::Backend {
                            reason: format!(
                                "timed out waiting for table lock {}; remove it if no other writer is running",
                                self.lock_path.display()
                            ),
                        });
                    }
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Held while a writer owns the table; removes the lock file on drop.
struct TableLease {
    path: PathBuf,
}

impl Drop for TableLease {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), %err, "failed to release table lock");
        }
    }
}

impl RecordStore for JsonTableStore {
    fn scan_attribute<'a>(&'a self, request: &'a ScanRequest) -> StoreFuture<'a, ScanPage> {
        Box::pin(async move {
            let table = self.load().await?;
            Ok(scan_page(&table, request))
        })
    }

    fn scan_prefix<'a>(&'a self, pk_prefix: &'a str) -> StoreFuture<'a, Vec<Item>> {
        Box::pin(async move {
            let table = self.load().await?;
            Ok(prefix_items(&table, pk_prefix))
        })
    }

    fn put_if_absent<'a>(&'a self, item: &'a Item) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let key = ItemKey::of(item)?;
            tokio::fs::create_dir_all(self.dir()).await?;
            let _lease = self.acquire_lease().await?;

            let mut table = self.load().await?;
            if table.contains_key(&key) {
                return Err(StoreError::ConditionFailed { key });
            }
            table.insert(key, item.clone());
            self.save(&table)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(pk: &str, id: u64) -> Item {
        json!({"pk": pk, "sk": "METADATA", "productionSiteId": id})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn named(pk: &str, name: &str) -> Item {
        json!({"pk": pk, "sk": "METADATA", "name": name}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTableStore::new(dir.path().join("sites.json"));
        let request = ScanRequest {
            attribute: "productionSiteId".into(),
            exclusive_start: None,
            limit: 10,
        };
        let page = store.scan_attribute(&request).await.unwrap();
        assert!(page.values.is_empty());
        assert!(page.last_key.is_none());
    }

    #[tokio::test]
    async fn writes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sites.json");

        let store = JsonTableStore::new(&path);
        store.put_if_absent(&item("ACME_P0001", 1)).await.unwrap();
        store.put_if_absent(&item("ACME_P0002", 2)).await.unwrap();
        drop(store);

        let reopened = JsonTableStore::new(&path);
        let items = reopened.scan_prefix("ACME_P").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["productionSiteId"], json!(2));

        // Only the table itself remains: no lease, no temp files.
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, [OsString::from("sites.json")]);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTableStore::new(dir.path().join("sites.json"));
        store.put_if_absent(&item("ACME_P0001", 1)).await.unwrap();

        let err = store.put_if_absent(&item("ACME_P0001", 1)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConditionFailed { ref key } if key.pk == "ACME_P0001"
        ));
    }

    #[tokio::test]
    async fn separate_handles_racing_for_one_key_keep_the_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        let first = JsonTableStore::new(&path);
        let second = JsonTableStore::new(&path);
        let north = named("ACME_P0001", "North");
        let south = named("ACME_P0001", "South");

        let (a, b) = tokio::join!(first.put_if_absent(&north), second.put_if_absent(&south));

        let winner = match (a, b) {
            (Ok(()), Err(StoreError::ConditionFailed { .. })) => "North",
            (Err(StoreError::ConditionFailed { .. }), Ok(())) => "South",
            other => panic!("expected one success and one condition failure, got {other:?}"),
        };
        let stored = JsonTableStore::new(&path).scan_prefix("ACME_").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["name"], winner);
    }

    #[tokio::test]
    async fn separate_handles_inserting_different_keys_keep_both() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        let first = JsonTableStore::new(&path);
        let second = JsonTableStore::new(&path);
        let acme = named("ACME_P0001", "North");
        let other = named("OTHER_P0001", "South");

        let (a, b) = tokio::join!(first.put_if_absent(&acme), second.put_if_absent(&other));
        a.unwrap();
        b.unwrap();

        let stored = JsonTableStore::new(&path).scan_prefix("").await.unwrap();
        let keys: Vec<&str> = stored.iter().map(|i| i["pk"].as_str().unwrap()).collect();
        assert_eq!(keys, ["ACME_P0001", "OTHER_P0001"]);
    }

    #[tokio::test]
    async fn held_lease_times_out_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        let store = JsonTableStore::new(&path).with_lock_timeout(Duration::from_millis(60));
        std::fs::write(store.lock_path(), b"").unwrap();

        let err = store.put_if_absent(&item("ACME_P0001", 1)).await.unwrap_err();
        assert_eq!(err.kind(), "backend");
        assert!(err.to_string().contains("sites.json.lock"));
        assert!(!path.exists());
        // The lease belongs to someone else and stays in place.
        assert!(store.lock_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_reports_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonTableStore::new(&path);
        let err = store.scan_prefix("A").await.unwrap_err();
        assert_eq!(err.kind(), "encoding");
    }
}
