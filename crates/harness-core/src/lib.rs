//! Harness Core Library
//!
//! Deterministic harness identity, label-based skip policy, the per-process
//! runtime registry, and assembly of k3s bootstrap specifications from
//! resource and provider configuration.

pub mod bootstrap;
pub mod diagnostics;
pub mod encoder;
mod error;
pub mod feature;
pub mod lifecycle;
pub mod obs;
pub mod orchestrator;
pub mod provider;
pub mod runtime;
pub mod skip;
pub mod telemetry;

pub use bootstrap::{
    build_bootstrap_spec, BootstrapSources, BootstrapSpec, ImageRef, K3sHarnessConfig,
    K3sProviderDefaults, RegistryAuth,
};
pub use diagnostics::{Diagnostic, Severity};
pub use encoder::{display_name, SeedEncoder, ENCODED_SEED_LEN};
pub use error::{HarnessError, Result};
pub use feature::{Attachment, FeatureBinding};
pub use lifecycle::{CreateOutcome, HarnessController, HarnessState, PlanOutcome, PlanRequest};
pub use obs::{
    emit_harness_created, emit_harness_planned, emit_harness_skipped, emit_setup_failed,
    emit_setup_started,
};
pub use orchestrator::{
    DryRunFactory, DryRunHandle, HandleFactory, OrchestrationError, OrchestrationHandle,
};
pub use provider::{HarnessDefaults, ProviderConfig, ProviderStore};
pub use runtime::RuntimeRegistry;
pub use skip::should_skip;
pub use telemetry::{init_tracing, LogFormat};

pub use harness_inventory::{Feature, HarnessId, Labels, Seed};

/// Harness core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
