//! Site categories and the per-category naming they drive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a site produces or consumes energy.
///
/// The category picks the id namespace, the stored id attribute and the
/// single-letter key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteCategory {
    /// Generation facility.
    Production,
    /// Load facility.
    Consumption,
}

impl SiteCategory {
    /// Both categories, in display order.
    pub const ALL: [Self; 2] = [Self::Production, Self::Consumption];

    /// Letter embedded in the primary key after the company id.
    #[must_use]
    pub fn key_prefix(self) -> char {
        match self {
            Self::Production => 'P',
            Self::Consumption => 'C',
        }
    }

    /// Item attribute that stores this category's numeric id.
    #[must_use]
    pub fn id_attribute(self) -> &'static str {
        match self {
            Self::Production => "productionSiteId",
            Self::Consumption => "consumptionSiteId",
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Consumption => "consumption",
        }
    }

    /// Capitalised name used in user-facing messages.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Production => "Production",
            Self::Consumption => "Consumption",
        }
    }

    /// Resolves a key-prefix letter back to its category.
    #[must_use]
    pub fn from_key_prefix(prefix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key_prefix() == prefix)
    }
}

impl fmt::Display for SiteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "consumption" => Ok(Self::Consumption),
            other => Err(format!(
                "unknown site category `{other}` (expected `production` or `consumption`)"
            )),
        }
    }
}
