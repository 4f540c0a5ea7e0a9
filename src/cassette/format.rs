//! On-disk cassette structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ports::{ItemKey, StoreError};

/// One call made through a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name (`clock`, `store`).
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments of the call.
    pub input: serde_json::Value,
    /// What the port returned.
    pub output: serde_json::Value,
}

/// A named, ordered list of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Source revision the recording was made from.
    pub commit: String,
    /// Interactions in call order.
    pub interactions: Vec<Interaction>,
}

/// A store failure as written into a cassette.
///
/// Only the conditional-write rejection keeps its variant on replay; every
/// other failure comes back as [`StoreError::Backend`] with the original text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedStoreError {
    /// [`StoreError::kind`] of the original error.
    pub kind: String,
    /// Display text of the original error.
    pub message: String,
    /// Rejected key, for condition failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ItemKey>,
}

impl From<&StoreError> for RecordedStoreError {
    fn from(err: &StoreError) -> Self {
        let key = match err {
            StoreError::ConditionFailed { key } => Some(key.clone()),
            _ => None,
        };
        Self { kind: err.kind().to_string(), message: err.to_string(), key }
    }
}

impl From<RecordedStoreError> for StoreError {
    fn from(recorded: RecordedStoreError) -> Self {
        match recorded.key {
            Some(key) if recorded.kind == "condition_failed" => Self::ConditionFailed { key },
            _ => Self::Backend { reason: recorded.message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cassette_survives_yaml() {
        let cassette = Cassette {
            name: "create-one".into(),
            recorded_at: Utc::now(),
            commit: "abc123".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "store".into(),
                method: "put_if_absent".into(),
                input: json!({"pk": "ACME_P0001", "sk": "METADATA"}),
                output: json!({"ok": null}),
            }],
        };
        let yaml = serde_yaml::to_string(&cassette).expect("serialize");
        let back: Cassette = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(cassette, back);
    }

    #[test]
    fn condition_failures_keep_their_variant() {
        let original = StoreError::ConditionFailed { key: ItemKey::new("ACME_P0001", "METADATA") };
        let replayed: StoreError = RecordedStoreError::from(&original).into();
        assert!(matches!(replayed, StoreError::ConditionFailed { key } if key.pk == "ACME_P0001"));
    }

    #[test]
    fn other_failures_become_backend_errors() {
        let original = StoreError::Backend { reason: "throttled".into() };
        let replayed: StoreError = RecordedStoreError::from(&original).into();
        assert!(replayed.to_string().contains("throttled"));
        assert_eq!(replayed.kind(), "backend");
    }
}
