//! In-memory inventory store
//!
//! `MemoryInventoryStore` keeps every inventory for the lifetime of the
//! process. All mutations happen under one short `Mutex` critical section,
//! which is what makes `add_harness` an atomic check-and-insert.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::InventoryError;
use crate::model::{Feature, HarnessId, Seed};
use crate::store::{InventoryStore, StoreResult};

#[derive(Debug, Default)]
struct InventoryState {
    harnesses: BTreeMap<HarnessId, Vec<Feature>>,
}

/// Process-lifetime inventory store backed by a `HashMap<seed, InventoryState>`.
#[derive(Debug, Default)]
pub struct MemoryInventoryStore {
    inventories: Mutex<HashMap<Seed, InventoryState>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of inventories referenced so far.
    pub fn inventory_count(&self) -> StoreResult<usize> {
        Ok(self.inventories.lock()?.len())
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn add_harness(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<bool> {
        let mut inventories = self.inventories.lock()?;
        let inventory = inventories.entry(seed.clone()).or_default();
        if inventory.harnesses.contains_key(harness) {
            return Ok(false);
        }
        inventory.harnesses.insert(harness.clone(), Vec::new());
        debug!(seed = %seed, harness = %harness, "harness added to inventory");
        Ok(true)
    }

    async fn get_features(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<Vec<Feature>> {
        let inventories = self.inventories.lock()?;
        Ok(inventories
            .get(seed)
            .and_then(|inv| inv.harnesses.get(harness))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_feature(
        &self,
        seed: &Seed,
        harness: &HarnessId,
        feature: Feature,
    ) -> StoreResult<bool> {
        let mut inventories = self.inventories.lock()?;
        let features = inventories
            .get_mut(seed)
            .and_then(|inv| inv.harnesses.get_mut(harness))
            .ok_or_else(|| InventoryError::HarnessNotFound {
                seed: seed.to_string(),
                harness: harness.to_string(),
            })?;
        if features.iter().any(|f| f.name == feature.name) {
            return Ok(false);
        }
        debug!(seed = %seed, harness = %harness, feature = %feature.name, "feature registered");
        features.push(feature);
        Ok(true)
    }

    async fn harnesses(&self, seed: &Seed) -> StoreResult<Vec<HarnessId>> {
        let mut inventories = self.inventories.lock()?;
        Ok(inventories
            .entry(seed.clone())
            .or_default()
            .harnesses
            .keys()
            .cloned()
            .collect())
    }
}
