//! Failure kinds of the site workflow.

use thiserror::Error;

use super::category::SiteCategory;
use crate::ports::StoreError;

/// Errors returned by site allocation, creation and listing.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The caller's site data has no usable `companyId`.
    #[error("companyId is required to create a site")]
    MissingCompanyId,

    /// Reading existing ids failed, so no id could be allocated.
    #[error("failed to scan existing {category} site ids: {source}")]
    AllocationScan {
        /// Category being allocated.
        category: SiteCategory,
        /// Store failure.
        #[source]
        source: StoreError,
    },

    /// The largest stored id is already the largest representable one.
    #[error("no {category} site id is left above the largest stored id")]
    IdSpaceExhausted {
        /// Category being allocated.
        category: SiteCategory,
    },

    /// Another record already holds the allocated primary key.
    #[error("site {primary_key} already exists; the id was taken by a concurrent create")]
    DuplicateKey {
        /// Key that lost the race.
        primary_key: String,
    },

    /// The conditional insert failed for a reason other than a duplicate.
    #[error("failed to store site {primary_key}: {source}")]
    StoreWrite {
        /// Key being written.
        primary_key: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },

    /// Reading a company's sites failed.
    #[error("failed to list {category} sites of {company_id}: {source}")]
    ListScan {
        /// Company being listed.
        company_id: String,
        /// Category being listed.
        category: SiteCategory,
        /// Store failure.
        #[source]
        source: StoreError,
    },

    /// A stored item could not be read back as a site record.
    #[error("stored item {key} is not a valid site record: {reason}")]
    MalformedRecord {
        /// Primary key (or a placeholder when absent).
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl SiteError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCompanyId => "missing_company_id",
            Self::AllocationScan { .. } => "allocation_scan_failure",
            Self::IdSpaceExhausted { .. } => "id_space_exhausted",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::StoreWrite { .. } => "store_write_failure",
            Self::ListScan { .. } => "list_scan_failure",
            Self::MalformedRecord { .. } => "malformed_record",
        }
    }

    /// Whether re-running the whole create may succeed.
    ///
    /// Write failures are left to the caller: the store cause decides.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllocationScan { .. } | Self::DuplicateKey { .. } | Self::ListScan { .. }
        )
    }
}
