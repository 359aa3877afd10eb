//! Selector configuration.
//!
//! Options come either from the builder or from JSON-like configuration:
//!
//! ```json
//! { "equality": "shallow" }
//! { "equality": 3 }
//! { "equality": { "recalculate": "deep", "forceUpdate": ["shallow", null] } }
//! ```
//!
//! Unsupported values never fail to load. They degrade to reference
//! equality, the same way a missing value does.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::equality::EqualityPolicy;

/// Options attached to a selector definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorOptions {
    pub equality: EqualityConfig,
}

impl SelectorOptions {
    pub fn with_equality(equality: impl Into<EqualityConfig>) -> Self {
        Self {
            equality: equality.into(),
        }
    }
}

/// Equality policies for the two decision points of an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqualityConfig {
    /// Compared against the previous input tuple. When equal, the previous
    /// tuple is reused and the combiner is skipped.
    pub recalculate: EqualityPolicy,

    /// Per flattened input position. Applies to state readers only: a fresh
    /// reading equal to the previous one is replaced by the previous one.
    pub force_update: Vec<EqualityPolicy>,
}

impl EqualityConfig {
    /// Policy for the reader at flattened position `position`.
    pub fn force_update_at(&self, position: usize) -> EqualityPolicy {
        self.force_update.get(position).copied().unwrap_or_default()
    }

    fn from_json(config: &serde_json::Value) -> Self {
        let serde_json::Value::Object(fields) = config else {
            return EqualityPolicy::from_json(config).into();
        };

        let recalculate = fields
            .get("recalculate")
            .map(EqualityPolicy::from_json)
            .unwrap_or_default();

        let force_update = match fields.get("forceUpdate").or_else(|| fields.get("force_update")) {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(policies)) => {
                policies.iter().map(EqualityPolicy::from_json).collect()
            }
            Some(other) => {
                tracing::debug!(config = %other, "forceUpdate must be a list; ignoring it");
                Vec::new()
            }
        };

        Self {
            recalculate,
            force_update,
        }
    }
}

impl From<EqualityPolicy> for EqualityConfig {
    fn from(recalculate: EqualityPolicy) -> Self {
        Self {
            recalculate,
            force_update: Vec::new(),
        }
    }
}

/// A bare policy when only `recalculate` is set, an object otherwise.
impl Serialize for EqualityConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.force_update.is_empty() {
            return self.recalculate.serialize(serializer);
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("recalculate", &self.recalculate)?;
        map.serialize_entry("forceUpdate", &self.force_update)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for EqualityConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|config| Self::from_json(&config))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
