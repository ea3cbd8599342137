//! Storage trait for inventories
//!
//! `InventoryStore` is the backend-agnostic contract every inventory backend
//! satisfies:
//! - harness membership is an atomic check-and-insert
//! - feature queries never fail just because nothing is registered
//! - entries only accumulate; there is no removal path
//!
//! `Inventory` binds a store to one seed so callers can write
//! `store.inventory(seed).add_harness(id)`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::InventoryError;
use crate::model::{Feature, HarnessId, Seed};

/// Result type for inventory store operations
pub type StoreResult<T> = std::result::Result<T, InventoryError>;

/// Seed-scoped harness and feature registry.
///
/// Guarantees:
/// - `add_harness` returns `true` exactly once per (seed, harness), even
///   when many callers race on the same identifier.
/// - `get_features` returns an empty vec for a harness with no features.
/// - Inventories are created lazily on first reference to a seed.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Add a harness to the seed's inventory. Returns `false` if it was
    /// already present.
    async fn add_harness(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<bool>;

    /// All features registered against the harness, in registration order.
    async fn get_features(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<Vec<Feature>>;

    /// Register a feature against an existing harness. Returns `false` if a
    /// feature with the same name is already registered there.
    async fn add_feature(
        &self,
        seed: &Seed,
        harness: &HarnessId,
        feature: Feature,
    ) -> StoreResult<bool>;

    /// Harness identifiers in the seed's inventory, sorted.
    async fn harnesses(&self, seed: &Seed) -> StoreResult<Vec<HarnessId>>;
}

/// A store handle bound to a single inventory seed.
#[derive(Clone)]
pub struct Inventory {
    seed: Seed,
    store: Arc<dyn InventoryStore>,
}

impl Inventory {
    pub fn new(store: Arc<dyn InventoryStore>, seed: Seed) -> Self {
        Self { seed, store }
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub async fn add_harness(&self, harness: &HarnessId) -> StoreResult<bool> {
        self.store.add_harness(&self.seed, harness).await
    }

    pub async fn get_features(&self, harness: &HarnessId) -> StoreResult<Vec<Feature>> {
        self.store.get_features(&self.seed, harness).await
    }

    pub async fn add_feature(&self, harness: &HarnessId, feature: Feature) -> StoreResult<bool> {
        self.store.add_feature(&self.seed, harness, feature).await
    }

    pub async fn harnesses(&self) -> StoreResult<Vec<HarnessId>> {
        self.store.harnesses(&self.seed).await
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory").field("seed", &self.seed).finish()
    }
}
