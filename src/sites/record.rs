//! Site records and their stored item form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::category::SiteCategory;
use super::error::SiteError;
use super::key::{SiteKey, METADATA_SORT_KEY};
use crate::ports::record_store::{Item, PARTITION_KEY_ATTR, SORT_KEY_ATTR};

/// Attribute carrying the owning company.
pub const COMPANY_ID_ATTR: &str = "companyId";
const VERSION_ATTR: &str = "version";
const CREATED_AT_ATTR: &str = "createdAt";
const UPDATED_AT_ATTR: &str = "updatedAt";

/// A fully assembled site record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    /// Owning company.
    pub company_id: String,
    /// Site category.
    pub category: SiteCategory,
    /// Numeric id within the category.
    pub numeric_id: u64,
    /// `{companyId}_{P|C}{numericId:04}`.
    pub primary_key: String,
    /// Always [`METADATA_SORT_KEY`] for root records.
    pub sort_key: String,
    /// Optimistic concurrency token.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Caller-supplied attributes, without the computed ones.
    pub attributes: Map<String, Value>,
}

impl SiteRecord {
    /// Assembles a version-1 record for a freshly allocated id.
    ///
    /// Computed attributes are removed from `attributes` so the stored
    /// item always carries the computed values.
    #[must_use]
    pub fn assemble(
        key: &SiteKey,
        mut attributes: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        for computed in computed_attributes(key.category) {
            attributes.remove(computed);
        }
        Self {
            company_id: key.company_id.clone(),
            category: key.category,
            numeric_id: key.numeric_id,
            primary_key: key.primary_key(),
            sort_key: METADATA_SORT_KEY.to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
            attributes,
        }
    }

    /// Renders the stored item: caller attributes with computed ones merged over them.
    #[must_use]
    pub fn to_item(&self) -> Item {
        let mut item = self.attributes.clone();
        item.insert(PARTITION_KEY_ATTR.into(), Value::from(self.primary_key.clone()));
        item.insert(SORT_KEY_ATTR.into(), Value::from(self.sort_key.clone()));
        item.insert(COMPANY_ID_ATTR.into(), Value::from(self.company_id.clone()));
        item.insert(self.category.id_attribute().into(), Value::from(self.numeric_id));
        item.insert(VERSION_ATTR.into(), Value::from(self.version));
        item.insert(CREATED_AT_ATTR.into(), Value::from(self.created_at.to_rfc3339()));
        item.insert(UPDATED_AT_ATTR.into(), Value::from(self.updated_at.to_rfc3339()));
        item
    }

    /// Reads a stored item back into a record.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::MalformedRecord`] if the key cannot be parsed or
    /// a computed attribute is missing or of the wrong type.
    pub fn from_item(mut item: Item) -> Result<Self, SiteError> {
        let primary_key = match item.remove(PARTITION_KEY_ATTR) {
            Some(Value::String(pk)) => pk,
            _ => return Err(malformed("<missing pk>", "no string `pk` attribute")),
        };
        let key = SiteKey::parse(&primary_key)
            .ok_or_else(|| malformed(&primary_key, "primary key is not a site key"))?;
        let sort_key = take_string(&mut item, SORT_KEY_ATTR, &primary_key)?;
        let version = item
            .remove(VERSION_ATTR)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| malformed(&primary_key, "no integer `version` attribute"))?;
        let created_at = take_time(&mut item, CREATED_AT_ATTR, &primary_key)?;
        let updated_at = take_time(&mut item, UPDATED_AT_ATTR, &primary_key)?;
        item.remove(COMPANY_ID_ATTR);
        item.remove(key.category.id_attribute());

        Ok(Self {
            company_id: key.company_id,
            category: key.category,
            numeric_id: key.numeric_id,
            primary_key,
            sort_key,
            version,
            created_at,
            updated_at,
            attributes: item,
        })
    }
}

fn computed_attributes(category: SiteCategory) -> [&'static str; 7] {
    [
        PARTITION_KEY_ATTR,
        SORT_KEY_ATTR,
        COMPANY_ID_ATTR,
        category.id_attribute(),
        VERSION_ATTR,
        CREATED_AT_ATTR,
        UPDATED_AT_ATTR,
    ]
}

fn take_string(item: &mut Item, attribute: &str, key: &str) -> Result<String, SiteError> {
    match item.remove(attribute) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(malformed(key, &format!("no string `{attribute}` attribute"))),
    }
}

fn take_time(item: &mut Item, attribute: &str, key: &str) -> Result<DateTime<Utc>, SiteError> {
    let raw = take_string(item, attribute, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(key, &format!("`{attribute}` is not RFC 3339: {e}")))
}

fn malformed(key: &str, reason: &str) -> SiteError {
    SiteError::MalformedRecord { key: key.to_string(), reason: reason.to_string() }
}
