//! Site registry core: id allocation, creation and listing.
//!
//! A site's primary key is `{companyId}_{P|C}{id:04}`. Ids come from a
//! full scan of the store ([`SiteIdAllocator`]) and are only claimed once
//! the conditional insert in [`SiteCreator`] succeeds.

pub mod allocator;
pub mod category;
pub mod creator;
pub mod directory;
pub mod error;
pub mod key;
pub mod record;

pub use allocator::SiteIdAllocator;
pub use category::SiteCategory;
pub use creator::{RetryPolicy, SiteCreated, SiteCreator};
pub use directory::SiteDirectory;
pub use error::SiteError;
pub use key::{SiteKey, METADATA_SORT_KEY};
pub use record::SiteRecord;
