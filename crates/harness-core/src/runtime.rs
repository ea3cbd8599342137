//! Runtime registry: harness id → live orchestration handle.
//!
//! Separate from the inventory on purpose. The inventory tracks *declared*
//! membership; this map tracks *live* handles for the current process and is
//! rebuilt on every invocation that needs it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use harness_inventory::HarnessId;
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::orchestrator::OrchestrationHandle;

/// Concurrency-safe map of live handles. Lock sections never span `setup`.
#[derive(Default)]
pub struct RuntimeRegistry {
    handles: RwLock<HashMap<HarnessId, Arc<dyn OrchestrationHandle>>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handle, last writer wins. Returns the replaced handle, if any.
    pub fn set(
        &self,
        id: HarnessId,
        handle: Arc<dyn OrchestrationHandle>,
    ) -> Option<Arc<dyn OrchestrationHandle>> {
        debug!(harness = %id, "registering runtime handle");
        self.handles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle)
    }

    pub fn get(&self, id: &HarnessId) -> Option<Arc<dyn OrchestrationHandle>> {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Like [`get`](Self::get), but a missing id is a configuration error.
    pub fn require(&self, id: &HarnessId) -> Result<Arc<dyn OrchestrationHandle>> {
        self.get(id)
            .ok_or_else(|| HarnessError::HandleNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeRegistry")
            .field("handles", &self.len())
            .finish()
    }
}
