//! Error types for harness-inventory

use thiserror::Error;

/// Errors that can occur in the inventory layer.
///
/// A harness that is already present is never an error; `add_harness`
/// reports it through its boolean result instead.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The backing store could not be read or updated
    #[error("inventory backend failure: {0}")]
    Backend(String),

    /// A feature referenced a harness that was never added to the inventory
    #[error("harness {harness} not found in inventory {seed}")]
    HarnessNotFound { seed: String, harness: String },

    /// Inventory document could not be encoded or decoded
    #[error("inventory serialization failed: {0}")]
    Serialization(String),

    /// IO error from a file-backed store
    #[error("inventory io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for InventoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        InventoryError::Backend(format!("inventory lock poisoned: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_not_found_display() {
        let err = InventoryError::HarnessNotFound {
            seed: "seed-a".to_string(),
            harness: "k3s-abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("k3s-abc"));
        assert!(msg.contains("seed-a"));
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: InventoryError = err.into();
        assert!(matches!(err, InventoryError::Serialization(_)));
    }
}
