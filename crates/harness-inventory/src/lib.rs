//! Harness-Inventory: seed-scoped registry of harnesses and features
//!
//! This crate provides the bookkeeping layer for the harness orchestration
//! engine. An inventory is identified by an opaque seed and records which
//! harnesses were declared against it and which features depend on each
//! harness.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: atomic membership updates under concurrent planning.
//!
//! ## Key Components
//!
//! - `InventoryStore`: async storage contract (`add_harness`, `get_features`, ...)
//! - `Inventory`: a store handle bound to one seed
//! - `MemoryInventoryStore`: process-lifetime store used by the provider
//! - `FsInventoryStore`: JSON-document store for sharing across invocations

mod error;
pub mod fs;
pub mod memory;
mod model;
pub mod store;

pub use error::InventoryError;
pub use fs::FsInventoryStore;
pub use memory::MemoryInventoryStore;
pub use model::{Feature, HarnessId, Labels, Seed};
pub use store::{Inventory, InventoryStore, StoreResult};

/// Result type for harness-inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;
