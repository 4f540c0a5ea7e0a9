//! `siteledger create` command.

use serde_json::{json, Map, Value};

use super::describe;
use crate::context::ServiceContext;
use crate::sites::record::COMPANY_ID_ATTR;
use crate::sites::{RetryPolicy, SiteCategory, SiteCreator};

/// Execute the `create` command.
///
/// `--company` is written into the site data as `companyId`, overriding an
/// `--attr companyId=...`. The output mirrors the creation result:
/// `{"success": true, "data": <record>, "message": ...}`.
///
/// # Errors
///
/// Returns the site error, kind first, if creation fails.
pub async fn run(
    ctx: &ServiceContext,
    category: SiteCategory,
    company: Option<&str>,
    attributes: &[(String, Value)],
    attempts: u32,
) -> Result<Value, String> {
    let mut site_data: Map<String, Value> = attributes.iter().cloned().collect();
    if let Some(company) = company {
        site_data.insert(COMPANY_ID_ATTR.to_string(), Value::from(company));
    }

    let created = SiteCreator::from_context(ctx)
        .create_site_retrying(site_data, category, RetryPolicy::attempts(attempts))
        .await
        .map_err(|e| describe(&e))?;

    Ok(json!({
        "success": true,
        "data": created.record.to_item(),
        "message": created.message,
    }))
}
