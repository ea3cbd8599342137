//! Feature side of the harness contract.
//!
//! Features register themselves against a harness's inventory during plan
//! and, at apply time, attach to the live handle the harness stored in the
//! runtime registry.

use std::sync::Arc;

use harness_inventory::Feature;
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::lifecycle::HarnessState;
use crate::orchestrator::OrchestrationHandle;
use crate::provider::ProviderStore;

/// What a feature gets when it asks for its harness.
pub enum Attachment {
    Running(Arc<dyn OrchestrationHandle>),
    /// The harness was skipped; the feature should skip too.
    Skipped,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Running(handle) => f.debug_tuple("Running").field(handle.id()).finish(),
            Attachment::Skipped => f.write_str("Skipped"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureBinding {
    store: Arc<ProviderStore>,
}

impl FeatureBinding {
    pub fn new(store: Arc<ProviderStore>) -> Self {
        Self { store }
    }

    /// Register a feature under its harness. Returns `false` if a feature
    /// with that name was already registered.
    pub async fn register(&self, harness: &HarnessState, feature: Feature) -> Result<bool> {
        let name = feature.name.clone();
        let added = self
            .store
            .inventory(&harness.inventory)
            .add_feature(&harness.id, feature)
            .await
            .map_err(|e| HarnessError::inventory("failed to add feature", e))?;
        debug!(harness = %harness.id, feature = %name, added, "feature registration");
        Ok(added)
    }

    /// Resolve the live handle for a harness.
    ///
    /// A non-skipped harness without a handle means the feature was
    /// evaluated before its harness was created; that is a fatal
    /// configuration error.
    pub fn attach(&self, harness: &HarnessState) -> Result<Attachment> {
        if harness.skipped {
            return Ok(Attachment::Skipped);
        }
        self.store
            .runtime()
            .require(&harness.id)
            .map(Attachment::Running)
    }
}
