//! Existence checks: absent before save, present after, and a failing
//! lookup degrades to "absent" instead of erroring.

use std::sync::Arc;

use hrp_registry::{ArtifactRef, ArtifactStore, Label, ModelDocument, ModelHandle, Presence};
use hrp_store::{Connection, MemoryObjectStore, StoreOp};

#[tokio::test]
async fn absent_then_present_after_save() {
    let mem = Arc::new(MemoryObjectStore::new());
    let store = ArtifactStore::new(Connection::new(mem.clone()));
    let artifact = ArtifactRef::new("b", "model-registry/model.json");
    let handle = ModelHandle::new(store.clone(), artifact.clone());

    assert_eq!(handle.presence().await, Presence::Absent);
    assert!(!handle.is_present().await);

    store
        .save_model_document(&ModelDocument::constant(Label::Negative), &artifact)
        .await
        .unwrap();

    assert_eq!(handle.presence().await, Presence::Present);
    assert!(handle.is_present().await);
    assert!(store.has_model(&artifact).await.unwrap());
}

#[tokio::test]
async fn lookup_failure_folds_to_absent() {
    let mem = Arc::new(MemoryObjectStore::new());
    mem.insert("b", "model-registry/model.json", br#"{"family":"constant","label":1}"#.to_vec());
    mem.fail_on(StoreOp::List);

    let store = ArtifactStore::new(Connection::new(mem.clone()));
    let artifact = ArtifactRef::new("b", "model-registry/model.json");
    let handle = ModelHandle::new(store.clone(), artifact.clone());

    match handle.presence().await {
        Presence::CheckFailed(reason) => assert!(reason.contains("injected failure")),
        other => panic!("expected CheckFailed, got {other:?}"),
    }
    assert!(!handle.is_present().await);

    // The store itself still reports the error.
    assert!(store.has_model(&artifact).await.is_err());
}

#[tokio::test]
async fn presence_is_prefix_based() {
    let mem = Arc::new(MemoryObjectStore::new());
    mem.insert("b", "model-registry/model.json.bak", b"{}".to_vec());
    let store = ArtifactStore::new(Connection::new(mem));

    let handle = ModelHandle::new(store, ArtifactRef::new("b", "model-registry/model.json"));
    assert!(handle.is_present().await);
}
