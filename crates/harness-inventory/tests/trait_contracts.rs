//! Trait contract tests for InventoryStore.
//!
//! Every backend must pass these. Each contract runs against the in-memory
//! store and the filesystem store.

use std::sync::Arc;

use harness_inventory::{
    Feature, FsInventoryStore, HarnessId, Inventory, InventoryError, InventoryStore,
    MemoryInventoryStore, Seed,
};

fn memory() -> Arc<dyn InventoryStore> {
    Arc::new(MemoryInventoryStore::new())
}

fn filesystem() -> (tempfile::TempDir, Arc<dyn InventoryStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsInventoryStore::new(dir.path()).unwrap();
    (dir, Arc::new(store))
}

// ===========================================================================
// add_harness
// ===========================================================================

async fn check_add_twice(store: Arc<dyn InventoryStore>) {
    let inv = Inventory::new(store, Seed::from("seed-1"));
    let id = HarnessId::from("k3s-0123456789ab");

    assert!(inv.add_harness(&id).await.unwrap());
    inv.add_feature(&id, Feature::new("smoke")).await.unwrap();
    assert!(!inv.add_harness(&id).await.unwrap());

    let feats = inv.get_features(&id).await.unwrap();
    assert_eq!(feats, vec![Feature::new("smoke")]);
}

#[tokio::test]
async fn memory_add_harness_twice_reports_added_once() {
    check_add_twice(memory()).await;
}

#[tokio::test]
async fn fs_add_harness_twice_reports_added_once() {
    let (_dir, store) = filesystem();
    check_add_twice(store).await;
}

async fn check_concurrent_add(store: Arc<dyn InventoryStore>) {
    let id = HarnessId::from("k3s-race");
    let seed = Seed::from("shared-seed");

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = id.clone();
            let seed = seed.clone();
            tokio::spawn(async move { store.add_harness(&seed, &id).await.unwrap() })
        })
        .collect();

    let results = futures::future::join_all(tasks).await;
    let added = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
    assert_eq!(added, 1);
    assert_eq!(store.harnesses(&seed).await.unwrap(), vec![id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_concurrent_add_harness_single_winner() {
    check_concurrent_add(memory()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fs_concurrent_add_harness_single_winner() {
    let (_dir, store) = filesystem();
    check_concurrent_add(store).await;
}

// ===========================================================================
// get_features
// ===========================================================================

async fn check_empty_features(store: Arc<dyn InventoryStore>) {
    let seed = Seed::from("quiet");
    let id = HarnessId::from("k3s-none");

    assert!(store.get_features(&seed, &id).await.unwrap().is_empty());
    store.add_harness(&seed, &id).await.unwrap();
    assert!(store.get_features(&seed, &id).await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_get_features_empty_is_not_error() {
    check_empty_features(memory()).await;
}

#[tokio::test]
async fn fs_get_features_empty_is_not_error() {
    let (_dir, store) = filesystem();
    check_empty_features(store).await;
}

async fn check_features_scoped_to_harness(store: Arc<dyn InventoryStore>) {
    let inv = Inventory::new(store, Seed::from("scoped"));
    let a = HarnessId::from("a-1");
    let b = HarnessId::from("b-1");
    inv.add_harness(&a).await.unwrap();
    inv.add_harness(&b).await.unwrap();

    inv.add_feature(&a, Feature::new("one").with_label("env", "dev"))
        .await
        .unwrap();
    inv.add_feature(&a, Feature::new("two")).await.unwrap();
    assert!(!inv.add_feature(&a, Feature::new("two")).await.unwrap());

    let feats_a = inv.get_features(&a).await.unwrap();
    let names: Vec<_> = feats_a.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["one", "two"]);
    assert!(inv.get_features(&b).await.unwrap().is_empty());
}

#[tokio::test]
async fn memory_features_are_scoped_to_their_harness() {
    check_features_scoped_to_harness(memory()).await;
}

#[tokio::test]
async fn fs_features_are_scoped_to_their_harness() {
    let (_dir, store) = filesystem();
    check_features_scoped_to_harness(store).await;
}

// ===========================================================================
// add_feature
// ===========================================================================

#[tokio::test]
async fn add_feature_requires_known_harness() {
    let (_dir, fs_store) = filesystem();
    for store in [memory(), fs_store] {
        let err = store
            .add_feature(&Seed::from("s"), &HarnessId::from("ghost"), Feature::new("f"))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::HarnessNotFound { .. }));
    }
}
