//! `siteledger list` command.

use serde_json::Value;

use super::describe;
use crate::context::ServiceContext;
use crate::sites::{SiteCategory, SiteDirectory};

/// Execute the `list` command: the company's stored items, by numeric id.
///
/// # Errors
///
/// Returns the site error, kind first, if the listing fails.
pub async fn run(
    ctx: &ServiceContext,
    category: SiteCategory,
    company: &str,
) -> Result<Value, String> {
    let sites = SiteDirectory::new(ctx.store.as_ref())
        .get_sites(company, category)
        .await
        .map_err(|e| describe(&e))?;
    Ok(Value::Array(sites.iter().map(|site| Value::Object(site.to_item())).collect()))
}
