//! Seed encoding and harness identity.
//!
//! A harness id is `{name}-{encoded-seed}`: readable, since it prefixes every
//! resource the harness creates, yet bound to its inventory so identical
//! names in different inventories never collide.

use harness_inventory::{HarnessId, Seed};
use sha2::{Digest, Sha256};

use crate::error::{HarnessError, Result};

/// Length of the encoded seed token (hex chars, 48 bits).
pub const ENCODED_SEED_LEN: usize = 12;

/// Deterministic seed encoder: truncated lowercase hex SHA-256.
///
/// Stable across calls and process restarts; holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedEncoder;

impl SeedEncoder {
    pub fn new() -> Self {
        SeedEncoder
    }

    /// Encode a seed into its short token. Blank seeds are rejected.
    pub fn encode(&self, seed: &str) -> Result<String> {
        if seed.trim().is_empty() {
            return Err(HarnessError::Encode("inventory seed is empty".to_string()));
        }
        let digest = hex::encode(Sha256::digest(seed.as_bytes()));
        Ok(digest[..ENCODED_SEED_LEN].to_string())
    }

    /// Compute `{name}-{encode(seed)}`.
    pub fn harness_id(&self, name: &str, seed: &Seed) -> Result<HarnessId> {
        if name.trim().is_empty() {
            return Err(HarnessError::InvalidInput(
                "harness name must not be empty".to_string(),
            ));
        }
        let encoded = self.encode(seed.as_str())?;
        Ok(HarnessId::new(format!("{name}-{encoded}")))
    }
}

/// Display name of a harness id: everything before the encoded seed.
pub fn display_name(id: &HarnessId) -> &str {
    let raw = id.as_str();
    match raw.rsplit_once('-') {
        Some((name, token)) if token.len() == ENCODED_SEED_LEN => name,
        _ => raw,
    }
}
