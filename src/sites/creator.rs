//! Site creation: allocate an id, assemble the record, insert it once.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::allocator::SiteIdAllocator;
use super::category::SiteCategory;
use super::error::SiteError;
use super::key::SiteKey;
use super::record::{SiteRecord, COMPANY_ID_ATTR};
use crate::context::ServiceContext;
use crate::ports::{Clock, RecordStore, StoreError};

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteCreated {
    /// The record as stored.
    pub record: SiteRecord,
    /// Confirmation naming the category.
    pub message: String,
}

/// How often a caller is willing to re-run a create that lost an id race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1).
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const NONE: Self = Self { max_attempts: 1 };

    /// A policy allowing `max_attempts` attempts in total.
    #[must_use]
    pub fn attempts(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NONE
    }
}

/// Creates site records against an injected store and clock.
pub struct SiteCreator<'a> {
    store: &'a dyn RecordStore,
    clock: &'a dyn Clock,
    allocator: SiteIdAllocator<'a>,
}

impl<'a> SiteCreator<'a> {
    /// Creates a creator over explicit ports.
    #[must_use]
    pub fn new(store: &'a dyn RecordStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock, allocator: SiteIdAllocator::new(store) }
    }

    /// Creates a creator over the ports of a service context.
    #[must_use]
    pub fn from_context(ctx: &'a ServiceContext) -> Self {
        Self::new(ctx.store.as_ref(), ctx.clock.as_ref())
            .with_scan_page_size(ctx.scan_page_size)
    }

    /// Sets the page size used by id allocation scans.
    #[must_use]
    pub fn with_scan_page_size(mut self, page_size: usize) -> Self {
        self.allocator = self.allocator.with_page_size(page_size);
        self
    }

    /// Allocates an id and inserts a new site built from `site_data`.
    ///
    /// Computed attributes (`pk`, `sk`, the category id attribute,
    /// `version`, timestamps) override anything of the same name in
    /// `site_data`. Nothing is retried; see [`Self::create_site_retrying`].
    ///
    /// # Errors
    ///
    /// - [`SiteError::MissingCompanyId`] before any store access.
    /// - [`SiteError::AllocationScan`] if the id scan fails.
    /// - [`SiteError::DuplicateKey`] if the allocated key was taken meanwhile.
    /// - [`SiteError::StoreWrite`] for any other write failure.
    pub async fn create_site(
        &self,
        site_data: Map<String, Value>,
        category: SiteCategory,
    ) -> Result<SiteCreated, SiteError> {
        let company_id = company_id(&site_data).ok_or(SiteError::MissingCompanyId)?;
        let span = info_span!("create_site", %category, company_id = %company_id);

        async move {
            let numeric_id = self.allocator.next_id(category).await?;
            let key = SiteKey::new(company_id, category, numeric_id);
            let record = SiteRecord::assemble(&key, site_data, self.clock.now());

            match self.store.put_if_absent(&record.to_item()).await {
                Ok(()) => {}
                Err(StoreError::ConditionFailed { .. }) => {
                    warn!(primary_key = %record.primary_key, "site id already taken");
                    return Err(SiteError::DuplicateKey { primary_key: record.primary_key });
                }
                Err(source) => {
                    error!(primary_key = %record.primary_key, error = %source, "site write failed");
                    return Err(SiteError::StoreWrite { primary_key: record.primary_key, source });
                }
            }

            info!(primary_key = %record.primary_key, numeric_id, "site created");
            let message = format!("{} site created successfully", category.title());
            Ok(SiteCreated { record, message })
        }
        .instrument(span)
        .await
    }

    /// Runs [`Self::create_site`], re-running the whole allocate-and-insert
    /// sequence after each [`SiteError::DuplicateKey`] until `policy` is spent.
    ///
    /// Every attempt scans afresh, so a retry gets a new id. Other errors are
    /// returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts run out, or the first
    /// non-duplicate error.
    pub async fn create_site_retrying(
        &self,
        site_data: Map<String, Value>,
        category: SiteCategory,
        policy: RetryPolicy,
    ) -> Result<SiteCreated, SiteError> {
        let mut attempt = 1;
        loop {
            match self.create_site(site_data.clone(), category).await {
                Err(SiteError::DuplicateKey { primary_key }) if attempt < policy.max_attempts => {
                    debug!(%primary_key, attempt, "retrying create after id collision");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Extracts a usable company id: a non-empty string, or a number.
fn company_id(site_data: &Map<String, Value>) -> Option<String> {
    match site_data.get(COMPANY_ID_ATTR)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
