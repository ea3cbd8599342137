//! Harness lifecycle: plan → maybe-skip → create.
//!
//! ```text
//! Planned ──skip──▶ Skipped
//!    │
//!    └──create──▶ Created ──read/update──▶ (unchanged)
//!                                 │
//!                               delete ──▶ (no teardown here)
//! ```
//!
//! Skip evaluation reads the features present in the inventory when create
//! runs. A feature that registers itself during the same apply wave as its
//! harness may not be visible yet.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use harness_inventory::{HarnessId, Seed};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::bootstrap::{build_bootstrap_spec, BootstrapSources, K3sHarnessConfig};
use crate::diagnostics::Diagnostic;
use crate::error::{HarnessError, Result};
use crate::obs;
use crate::provider::ProviderStore;
use crate::skip::{self, should_skip};

/// Persisted harness state, also handed to dependent features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessState {
    pub id: HarnessId,
    pub name: String,
    pub inventory: Seed,
    pub skipped: bool,
}

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub name: String,
    pub inventory: Seed,
    /// State from a previous apply, if any
    pub prior_state: Option<HarnessState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Planned {
        state: HarnessState,
        newly_added: bool,
    },
    /// Pre-existing state is left alone; no reconciliation is attempted.
    Unchanged(HarnessState),
}

impl PlanOutcome {
    pub fn state(&self) -> &HarnessState {
        match self {
            PlanOutcome::Planned { state, .. } | PlanOutcome::Unchanged(state) => state,
        }
    }

    pub fn into_state(self) -> HarnessState {
        match self {
            PlanOutcome::Planned { state, .. } | PlanOutcome::Unchanged(state) => state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub state: HarnessState,
    /// Non-fatal diagnostics (skip warnings)
    pub diagnostics: Vec<Diagnostic>,
}

/// Drives the k3s harness lifecycle against a shared [`ProviderStore`].
#[derive(Debug, Clone)]
pub struct HarnessController {
    store: Arc<ProviderStore>,
}

impl HarnessController {
    pub fn new(store: Arc<ProviderStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ProviderStore {
        &self.store
    }

    /// Compute the harness id and add it to the inventory.
    pub async fn plan(&self, request: PlanRequest) -> Result<PlanOutcome> {
        if let Some(prior) = request.prior_state {
            debug!(harness = %prior.id, "prior state present, plan unchanged");
            return Ok(PlanOutcome::Unchanged(prior));
        }

        let id = self
            .store
            .encoder()
            .harness_id(&request.name, &request.inventory)?;

        let newly_added = self
            .store
            .inventory(&request.inventory)
            .add_harness(&id)
            .await
            .map_err(|e| HarnessError::inventory("failed to add harness", e))?;

        if newly_added {
            info!(harness = %id, "harness added to inventory");
        }
        obs::emit_harness_planned(id.as_str(), request.inventory.as_str(), newly_added);

        Ok(PlanOutcome::Planned {
            state: HarnessState {
                id,
                name: request.name,
                inventory: request.inventory,
                skipped: false,
            },
            newly_added,
        })
    }

    /// Evaluate the skip policy against the features registered so far.
    pub async fn should_skip(&self, planned: &HarnessState) -> Result<bool> {
        let features = self
            .store
            .inventory(&planned.inventory)
            .get_features(&planned.id)
            .await
            .map_err(|e| HarnessError::inventory("failed to get features from harness", e))?;

        let skipped = should_skip(self.store.labels(), &features);
        if skipped {
            obs::emit_harness_skipped(planned.id.as_str(), features.len());
        }
        Ok(skipped)
    }

    /// Create the harness, resolving relative mount sources against the
    /// process's current working directory.
    pub async fn create(
        &self,
        planned: &HarnessState,
        config: &K3sHarnessConfig,
    ) -> Result<CreateOutcome> {
        let working_dir = std::env::current_dir().map_err(|e| {
            HarnessError::InvalidInput(format!("invalid mount source: working directory: {e}"))
        })?;
        self.create_in(planned, config, &working_dir).await
    }

    /// Create the harness with an explicit working directory.
    ///
    /// On timeout or setup failure the handle stays in the runtime registry
    /// and nothing is torn down.
    #[instrument(skip_all, fields(harness = %planned.id))]
    pub async fn create_in(
        &self,
        planned: &HarnessState,
        config: &K3sHarnessConfig,
        working_dir: &Path,
    ) -> Result<CreateOutcome> {
        let mut state = planned.clone();

        state.skipped = self.should_skip(planned).await?;
        if state.skipped {
            return Ok(CreateOutcome {
                diagnostics: vec![skip::skip_warning(&state.id)],
                state,
            });
        }

        let timeout = config.timeouts.create_timeout()?;
        let spec = build_bootstrap_spec(BootstrapSources {
            resource: config,
            defaults: self.store.k3s_defaults(),
            working_dir,
        })?;

        let handle = self
            .store
            .factory()
            .build(&state.id, spec)
            .map_err(HarnessError::Initialize)?;
        self.store.runtime().set(state.id.clone(), Arc::clone(&handle));

        info!(harness = %state.id, "creating k3s harness");
        obs::emit_setup_started(state.id.as_str(), duration_ms(timeout));

        let started = Instant::now();
        match tokio::time::timeout(timeout, handle.setup()).await {
            Ok(Ok(())) => {
                obs::emit_harness_created(state.id.as_str(), duration_ms(started.elapsed()));
                Ok(CreateOutcome {
                    state,
                    diagnostics: Vec::new(),
                })
            }
            Ok(Err(err)) => {
                obs::emit_setup_failed(state.id.as_str(), &err);
                Err(HarnessError::Setup(err))
            }
            Err(_elapsed) => {
                let err = HarnessError::Timeout {
                    limit_ms: duration_ms(timeout),
                };
                obs::emit_setup_failed(state.id.as_str(), &err);
                Err(err)
            }
        }
    }

    /// Read is a pass-through of prior state.
    pub fn read(&self, state: HarnessState) -> HarnessState {
        state
    }

    /// Update is a pass-through of planned state.
    pub fn update(&self, planned: HarnessState) -> HarnessState {
        planned
    }

    /// Delete reads prior state and performs no teardown. Container teardown
    /// belongs to whatever owns the container lifecycle.
    pub fn delete(&self, state: &HarnessState) {
        debug!(harness = %state.id, skipped = state.skipped, "delete: no teardown performed");
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
