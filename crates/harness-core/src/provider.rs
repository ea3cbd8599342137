//! Provider configuration and the per-process provider store.
//!
//! `ProviderStore` bundles the shared state every harness and feature
//! evaluation needs. It is built explicitly once per process invocation and
//! passed around as `Arc<ProviderStore>`; nothing here is an ambient global.

use std::path::Path;
use std::sync::Arc;

use harness_inventory::{Inventory, InventoryStore, Labels, Seed};
use serde::{Deserialize, Serialize};

use crate::bootstrap::K3sProviderDefaults;
use crate::encoder::SeedEncoder;
use crate::error::{HarnessError, Result};
use crate::orchestrator::HandleFactory;
use crate::runtime::RuntimeRegistry;

/// Provider-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Runtime label filter; empty disables label-based skipping
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub harnesses: HarnessDefaults,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessDefaults {
    #[serde(default)]
    pub k3s: Option<K3sProviderDefaults>,
}

impl ProviderConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }
}

/// Shared state for one process invocation.
pub struct ProviderStore {
    encoder: SeedEncoder,
    inventories: Arc<dyn InventoryStore>,
    runtime: Arc<RuntimeRegistry>,
    labels: Labels,
    k3s_defaults: K3sProviderDefaults,
    factory: Arc<dyn HandleFactory>,
}

impl ProviderStore {
    pub fn new(
        config: ProviderConfig,
        inventories: Arc<dyn InventoryStore>,
        factory: Arc<dyn HandleFactory>,
    ) -> Self {
        Self {
            encoder: SeedEncoder::new(),
            inventories,
            runtime: Arc::new(RuntimeRegistry::new()),
            labels: config.labels,
            k3s_defaults: config.harnesses.k3s.unwrap_or_default(),
            factory,
        }
    }

    pub fn encoder(&self) -> &SeedEncoder {
        &self.encoder
    }

    /// Inventory handle for a seed. The inventory itself is created lazily by
    /// the store on first use.
    pub fn inventory(&self, seed: &Seed) -> Inventory {
        Inventory::new(Arc::clone(&self.inventories), seed.clone())
    }

    pub fn runtime(&self) -> &RuntimeRegistry {
        &self.runtime
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn k3s_defaults(&self) -> &K3sProviderDefaults {
        &self.k3s_defaults
    }

    pub fn factory(&self) -> &dyn HandleFactory {
        self.factory.as_ref()
    }
}

impl std::fmt::Debug for ProviderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderStore")
            .field("labels", &self.labels)
            .field("k3s_defaults", &self.k3s_defaults)
            .field("runtime", &self.runtime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_from_json() {
        let cfg = ProviderConfig::from_json(
            r#"{
                "labels": { "env": "prod" },
                "harnesses": {
                    "k3s": {
                        "networks": [{ "name": "ci-net" }],
                        "registries": { "cgr.dev": { "auth": {} } }
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.labels.get("env").map(String::as_str), Some("prod"));
        let k3s = cfg.harnesses.k3s.unwrap();
        assert_eq!(k3s.networks[0].name, "ci-net");
        assert!(k3s.registries.contains_key("cgr.dev"));
    }

    #[test]
    fn test_empty_provider_config() {
        let cfg = ProviderConfig::from_json("{}").unwrap();
        assert!(cfg.labels.is_empty());
        assert!(cfg.harnesses.k3s.is_none());
    }

    #[test]
    fn test_malformed_provider_config() {
        assert!(matches!(
            ProviderConfig::from_json("{\"labels\": 3}"),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProviderConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
