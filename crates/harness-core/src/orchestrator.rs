//! Seams to the container runtime and cluster bootstrap implementation.
//!
//! The engine never talks to a container runtime directly. A
//! [`HandleFactory`] turns a resolved [`BootstrapSpec`] into an
//! [`OrchestrationHandle`], whose `setup` brings the cluster up.

use std::sync::Arc;

use async_trait::async_trait;
use harness_inventory::HarnessId;
use tracing::info;

use crate::bootstrap::BootstrapSpec;

/// Errors reported by orchestration backends.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("container runtime error: {0}")]
    Runtime(String),

    #[error("cluster bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("unsupported bootstrap specification: {0}")]
    Unsupported(String),
}

/// A live handle to one harness.
///
/// `setup` may run for minutes. Callers bound it with a deadline and drop the
/// future on expiry, so implementations must tolerate cancellation at any
/// await point. No cleanup is implied by cancellation.
#[async_trait]
pub trait OrchestrationHandle: Send + Sync {
    fn id(&self) -> &HarnessId;

    async fn setup(&self) -> Result<(), OrchestrationError>;
}

/// Builds orchestration handles from resolved specifications.
pub trait HandleFactory: Send + Sync {
    fn build(
        &self,
        id: &HarnessId,
        spec: BootstrapSpec,
    ) -> Result<Arc<dyn OrchestrationHandle>, OrchestrationError>;
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Handle that logs its specification instead of starting containers.
#[derive(Debug)]
pub struct DryRunHandle {
    id: HarnessId,
    spec: BootstrapSpec,
}

impl DryRunHandle {
    pub fn spec(&self) -> &BootstrapSpec {
        &self.spec
    }
}

#[async_trait]
impl OrchestrationHandle for DryRunHandle {
    fn id(&self) -> &HarnessId {
        &self.id
    }

    async fn setup(&self) -> Result<(), OrchestrationError> {
        info!(
            harness = %self.id,
            registries = self.spec.registries.len(),
            networks = ?self.spec.networks,
            sandbox_image = %self.spec.sandbox.image,
            "dry run: skipping k3s bootstrap"
        );
        Ok(())
    }
}

/// Factory producing [`DryRunHandle`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunFactory;

impl HandleFactory for DryRunFactory {
    fn build(
        &self,
        id: &HarnessId,
        spec: BootstrapSpec,
    ) -> Result<Arc<dyn OrchestrationHandle>, OrchestrationError> {
        Ok(Arc::new(DryRunHandle {
            id: id.clone(),
            spec,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_setup_succeeds() {
        let handle = DryRunFactory
            .build(&HarnessId::from("k3s-abc"), BootstrapSpec::default())
            .unwrap();
        assert_eq!(handle.id().as_str(), "k3s-abc");
        handle.setup().await.unwrap();
    }
}
