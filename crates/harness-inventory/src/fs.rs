//! Filesystem-backed inventory store
//!
//! One JSON document per seed lets separate invocations (plan, then apply)
//! observe the same inventory.
//!
//! Layout: `<root>/<first 16 hex chars of sha256(seed)>.json`

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::InventoryError;
use crate::model::{Feature, HarnessId, Seed};
use crate::store::{InventoryStore, StoreResult};

#[derive(Debug, Serialize, Deserialize)]
struct InventoryDocument {
    seed: Seed,
    #[serde(default)]
    harnesses: BTreeMap<HarnessId, Vec<Feature>>,
    updated_at: Option<DateTime<Utc>>,
}

impl InventoryDocument {
    fn empty(seed: &Seed) -> Self {
        Self {
            seed: seed.clone(),
            harnesses: BTreeMap::new(),
            updated_at: None,
        }
    }
}

/// Inventory store persisting each seed's inventory as a JSON document.
///
/// Read-modify-write cycles are serialized by a store-wide async mutex, so
/// the at-most-one "added" guarantee holds for every caller sharing this
/// store instance.
pub struct FsInventoryStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsInventoryStore {
    /// Create a store rooted at `root`. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn document_path(&self, seed: &Seed) -> PathBuf {
        let digest = hex::encode(Sha256::digest(seed.as_str().as_bytes()));
        self.root.join(format!("{}.json", &digest[..16]))
    }

    async fn load(&self, seed: &Seed) -> StoreResult<InventoryDocument> {
        let path = self.document_path(seed);
        let seed = seed.clone();
        blocking(move || read_document(&path, &seed)).await
    }

    async fn store(&self, doc: InventoryDocument) -> StoreResult<()> {
        let root = self.root.clone();
        let path = self.document_path(&doc.seed);
        blocking(move || write_document(&root, &path, doc)).await
    }
}

/// Run document I/O on the blocking pool.
async fn blocking<T, F>(f: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| InventoryError::Backend(format!("inventory I/O task failed: {e}")))?
}

fn read_document(path: &Path, seed: &Seed) -> StoreResult<InventoryDocument> {
    match fs::read(path) {
        Ok(bytes) => {
            let doc: InventoryDocument = serde_json::from_slice(&bytes)?;
            if doc.seed != *seed {
                return Err(InventoryError::Backend(format!(
                    "inventory document {} belongs to seed {}",
                    path.display(),
                    doc.seed
                )));
            }
            Ok(doc)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InventoryDocument::empty(seed)),
        Err(e) => Err(InventoryError::Io(e)),
    }
}

fn write_document(root: &Path, path: &Path, mut doc: InventoryDocument) -> StoreResult<()> {
    doc.updated_at = Some(Utc::now());
    let bytes = serde_json::to_vec_pretty(&doc)?;

    // Atomic write: temp file in the same directory, then rename.
    let mut tmp = NamedTempFile::new_in(root)?;
    tmp.write_all(&bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl InventoryStore for FsInventoryStore {
    async fn add_harness(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(seed).await?;
        if doc.harnesses.contains_key(harness) {
            return Ok(false);
        }
        doc.harnesses.insert(harness.clone(), Vec::new());
        self.store(doc).await?;
        debug!(seed = %seed, harness = %harness, "harness persisted to inventory");
        Ok(true)
    }

    async fn get_features(&self, seed: &Seed, harness: &HarnessId) -> StoreResult<Vec<Feature>> {
        let _guard = self.write_lock.lock().await;
        let doc = self.load(seed).await?;
        Ok(doc.harnesses.get(harness).cloned().unwrap_or_default())
    }

    async fn add_feature(
        &self,
        seed: &Seed,
        harness: &HarnessId,
        feature: Feature,
    ) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load(seed).await?;
        let features =
            doc.harnesses
                .get_mut(harness)
                .ok_or_else(|| InventoryError::HarnessNotFound {
                    seed: seed.to_string(),
                    harness: harness.to_string(),
                })?;
        if features.iter().any(|f| f.name == feature.name) {
            return Ok(false);
        }
        features.push(feature);
        self.store(doc).await?;
        Ok(true)
    }

    async fn harnesses(&self, seed: &Seed) -> StoreResult<Vec<HarnessId>> {
        let _guard = self.write_lock.lock().await;
        let doc = self.load(seed).await?;
        Ok(doc.harnesses.into_keys().collect())
    }
}
