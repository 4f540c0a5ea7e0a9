//! `siteledger next-id` command.

use serde_json::{json, Value};

use super::describe;
use crate::context::ServiceContext;
use crate::sites::{SiteCategory, SiteIdAllocator};

/// Execute the `next-id` command.
///
/// The answer is advisory: a concurrent create may claim the id first.
///
/// # Errors
///
/// Returns the site error, kind first, if the scan fails.
pub async fn run(ctx: &ServiceContext, category: SiteCategory) -> Result<Value, String> {
    let next = SiteIdAllocator::new(ctx.store.as_ref())
        .with_page_size(ctx.scan_page_size)
        .next_id(category)
        .await
        .map_err(|e| describe(&e))?;
    Ok(json!({ "category": category, "nextId": next }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_store_starts_at_one() {
        let ctx = ServiceContext::in_memory();
        let output = run(&ctx, SiteCategory::Production).await.unwrap();
        assert_eq!(output, json!({"category": "production", "nextId": 1}));
    }
}
