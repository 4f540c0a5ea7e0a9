//! Composite primary keys for site records.

use super::category::SiteCategory;

/// Sort key of a site's root record.
pub const METADATA_SORT_KEY: &str = "METADATA";

/// Minimum digits of the numeric part of a primary key.
const ID_WIDTH: usize = 4;

/// Parsed form of `{companyId}_{P|C}{numericId:04}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteKey {
    /// Owning company.
    pub company_id: String,
    /// Site category.
    pub category: SiteCategory,
    /// Numeric id within the category.
    pub numeric_id: u64,
}

impl SiteKey {
    /// Builds a key from its parts.
    pub fn new(company_id: impl Into<String>, category: SiteCategory, numeric_id: u64) -> Self {
        Self { company_id: company_id.into(), category, numeric_id }
    }

    /// Renders the primary key string.
    #[must_use]
    pub fn primary_key(&self) -> String {
        format!(
            "{}{:0width$}",
            company_prefix(&self.company_id, self.category),
            self.numeric_id,
            width = ID_WIDTH
        )
    }

    /// Parses a primary key back into its parts.
    ///
    /// The company id may itself contain underscores; the last underscore
    /// separates it from the category letter and digits.
    #[must_use]
    pub fn parse(primary_key: &str) -> Option<Self> {
        let (company_id, tail) = primary_key.rsplit_once('_')?;
        let mut chars = tail.chars();
        let category = SiteCategory::from_key_prefix(chars.next()?)?;
        let digits = chars.as_str();
        if company_id.is_empty() || digits.len() < ID_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let numeric_id = digits.parse().ok()?;
        Some(Self::new(company_id, category, numeric_id))
    }
}

/// Primary-key prefix shared by all of a company's sites in one category.
#[must_use]
pub fn company_prefix(company_id: &str, category: SiteCategory) -> String {
    format!("{company_id}_{}", category.key_prefix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_four_digits() {
        assert_eq!(SiteKey::new("ACME", SiteCategory::Production, 8).primary_key(), "ACME_P0008");
        assert_eq!(SiteKey::new("X1", SiteCategory::Consumption, 1).primary_key(), "X1_C0001");
    }

    #[test]
    fn wide_ids_keep_all_digits() {
        let key = SiteKey::new("ACME", SiteCategory::Production, 12_345);
        assert_eq!(key.primary_key(), "ACME_P12345");
    }

    #[test]
    fn parse_handles_underscored_company() {
        let key = SiteKey::parse("NORTH_GRID_C0042").unwrap();
        assert_eq!(key, SiteKey::new("NORTH_GRID", SiteCategory::Consumption, 42));
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert_eq!(SiteKey::parse("ACME"), None);
        assert_eq!(SiteKey::parse("ACME_X0001"), None);
        assert_eq!(SiteKey::parse("ACME_P01"), None);
        assert_eq!(SiteKey::parse("ACME_P00a1"), None);
        assert_eq!(SiteKey::parse("_P0001"), None);
    }

    #[test]
    fn prefix_matches_rendered_keys() {
        let key = SiteKey::new("ACME", SiteCategory::Production, 3);
        assert!(key.primary_key().starts_with(&company_prefix("ACME", SiteCategory::Production)));
        assert!(!key.primary_key().starts_with(&company_prefix("ACME", SiteCategory::Consumption)));
    }
}
