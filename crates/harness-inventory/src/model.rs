//! Inventory records: seeds, harness identifiers and features.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature labels. Keys are unique; iteration order is stable.
pub type Labels = BTreeMap<String, String>;

/// Opaque string identifying one logical test environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed(pub String);

impl Seed {
    pub fn new(seed: impl Into<String>) -> Self {
        Seed(seed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed(s.to_string())
    }
}

/// Harness identifier of the form `{name}-{encoded-seed}`.
///
/// Treated as opaque by the inventory; only the leading `{name}-` is meant
/// for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarnessId(pub String);

impl HarnessId {
    pub fn new(id: impl Into<String>) -> Self {
        HarnessId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HarnessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HarnessId {
    fn from(s: &str) -> Self {
        HarnessId(s.to_string())
    }
}

/// A test unit attached to exactly one harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name, unique within its harness
    pub name: String,
    /// Descriptive labels used for selective skipping
    #[serde(default)]
    pub labels: Labels,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Feature {
            name: name.into(),
            labels: Labels::new(),
        }
    }

    /// Add a label (builder style).
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
