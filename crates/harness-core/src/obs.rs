//! Structured observability hooks for harness lifecycle events.
//!
//! Emission functions for plan, skip, setup start, creation and failure.
//! Lifecycle futures carry a `harness` span via `#[instrument]`, so these
//! events inherit the harness id when emitted inside one.
//!
//! Filter with `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

pub fn emit_harness_planned(harness_id: &str, seed: &str, newly_added: bool) {
    info!(
        event = "harness.planned",
        harness = %harness_id,
        seed = %seed,
        newly_added = newly_added,
    );
}

pub fn emit_harness_skipped(harness_id: &str, feature_count: usize) {
    warn!(
        event = "harness.skipped",
        harness = %harness_id,
        features = feature_count,
    );
}

pub fn emit_setup_started(harness_id: &str, timeout_ms: u64) {
    info!(event = "harness.setup_started", harness = %harness_id, timeout_ms = timeout_ms);
}

pub fn emit_harness_created(harness_id: &str, duration_ms: u64) {
    info!(event = "harness.created", harness = %harness_id, duration_ms = duration_ms);
}

pub fn emit_setup_failed(harness_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "harness.setup_failed", harness = %harness_id, error = %error);
}
