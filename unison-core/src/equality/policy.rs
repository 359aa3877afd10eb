//! Equality policy and its configuration form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How two values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EqualityPolicy {
    /// Identity only.
    #[default]
    Reference,

    /// Open containers up to this many levels, then fall back to identity.
    Shallow(usize),

    /// Open containers at every level.
    Deep,
}

impl EqualityPolicy {
    /// The policy configured by the string `"shallow"`.
    pub const SHALLOW: Self = Self::Shallow(1);

    /// Parse a configuration string.
    ///
    /// Accepts `"deep"`, `"shallow"` and `"reference"` in any case, or a
    /// non-negative integer depth. Anything else degrades to
    /// [`EqualityPolicy::Reference`].
    pub fn parse(config: &str) -> Self {
        let trimmed = config.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "deep" => Self::Deep,
            "shallow" => Self::SHALLOW,
            "reference" => Self::Reference,
            other => match other.parse::<usize>() {
                Ok(depth) => Self::Shallow(depth),
                Err(_) => {
                    tracing::debug!(config = trimmed, "unsupported equality config; using reference equality");
                    Self::Reference
                }
            },
        }
    }

    /// Interpret a JSON configuration value.
    ///
    /// Strings go through [`EqualityPolicy::parse`]; non-negative integers
    /// select a shallow depth; `null` means the default. Anything else
    /// degrades to [`EqualityPolicy::Reference`].
    pub fn from_json(config: &serde_json::Value) -> Self {
        match config {
            serde_json::Value::Null => Self::Reference,
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(depth) => Self::Shallow(usize::try_from(depth).unwrap_or(usize::MAX)),
                None => {
                    tracing::debug!(config = %n, "unsupported equality depth; using reference equality");
                    Self::Reference
                }
            },
            other => {
                tracing::debug!(config = %other, "unsupported equality config; using reference equality");
                Self::Reference
            }
        }
    }

    /// Whether this policy never looks inside a container.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference | Self::Shallow(0))
    }

    /// Number of container levels that may be opened; `None` is unbounded.
    pub(crate) fn depth_budget(&self) -> Option<usize> {
        match self {
            Self::Reference => Some(0),
            Self::Shallow(depth) => Some(*depth),
            Self::Deep => None,
        }
    }
}

impl fmt::Display for EqualityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("reference"),
            Self::Shallow(1) => f.write_str("shallow"),
            Self::Shallow(depth) => write!(f, "shallow({depth})"),
            Self::Deep => f.write_str("deep"),
        }
    }
}

impl Serialize for EqualityPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Reference => serializer.serialize_str("reference"),
            Self::Shallow(1) => serializer.serialize_str("shallow"),
            Self::Shallow(depth) => serializer.serialize_u64(*depth as u64),
            Self::Deep => serializer.serialize_str("deep"),
        }
    }
}

/// Never fails: unsupported configuration degrades to reference equality.
impl<'de> Deserialize<'de> for EqualityPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|config| Self::from_json(&config))
    }
}
