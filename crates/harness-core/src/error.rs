//! Error taxonomy for harness orchestration.
//!
//! Every variant maps to a short static title (see [`HarnessError::title`])
//! so the phase boundary can surface it as a [`Diagnostic`] unchanged.

use harness_inventory::InventoryError;

use crate::diagnostics::Diagnostic;
use crate::orchestrator::OrchestrationError;

/// Errors produced by the orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Malformed image references, mount sources, mirror lists, timeouts.
    #[error("invalid resource input: {0}")]
    InvalidInput(String),

    #[error("encoding harness id: {0}")]
    Encode(String),

    #[error("{context}: {source}")]
    Inventory {
        context: &'static str,
        #[source]
        source: InventoryError,
    },

    #[error("failed to initialize k3s harness: {0}")]
    Initialize(#[source] OrchestrationError),

    #[error("failed to setup harness: {0}")]
    Setup(#[source] OrchestrationError),

    #[error("harness setup timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    /// A feature asked for a harness that no create ever registered. Only
    /// reachable through a dependency-ordering violation.
    #[error("no running harness registered for id {0}")]
    HandleNotFound(String),

    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl HarnessError {
    /// Wrap an inventory failure with the phase-specific title.
    pub fn inventory(context: &'static str, source: InventoryError) -> Self {
        HarnessError::Inventory { context, source }
    }

    /// Short static title used as the diagnostic summary.
    pub fn title(&self) -> &'static str {
        match self {
            HarnessError::InvalidInput(_) => "invalid resource input",
            HarnessError::Encode(_) => "failed to add harness",
            HarnessError::Inventory { context, .. } => *context,
            HarnessError::Initialize(_) => "failed to initialize k3s harness",
            HarnessError::Setup(_) | HarnessError::Timeout { .. } => "failed to setup harness",
            HarnessError::HandleNotFound(_) => "harness not found",
            HarnessError::Config(_) => "invalid provider data",
        }
    }

    /// Render as an error diagnostic: static title, verbatim detail.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.title(), self.to_string())
    }
}

impl From<InventoryError> for HarnessError {
    fn from(source: InventoryError) -> Self {
        HarnessError::inventory("inventory operation failed", source)
    }
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
