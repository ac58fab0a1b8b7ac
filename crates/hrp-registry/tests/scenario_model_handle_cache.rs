//! Handle caching: one fetch per handle, warm handles keep the old model
//! across an overwrite, fresh handles see the new one.

use std::sync::Arc;

use hrp_registry::{ArtifactRef, ArtifactStore, Label, ModelDocument, ModelHandle, TabularBatch};
use hrp_store::{Connection, ErrorKind, MemoryObjectStore};

fn setup() -> (Arc<MemoryObjectStore>, ArtifactStore, ArtifactRef) {
    let mem = Arc::new(MemoryObjectStore::new());
    let store = ArtifactStore::new(Connection::new(mem.clone()));
    let artifact = ArtifactRef::new("heart-attack-predictor", "model-registry/model.json");
    (mem, store, artifact)
}

fn rows(n: usize) -> TabularBatch {
    let mut csv = String::from("Age\n");
    for i in 0..n {
        csv.push_str(&format!("{}\n", 40 + i));
    }
    TabularBatch::from_csv_bytes(csv.as_bytes()).unwrap()
}

#[tokio::test]
async fn predict_fetches_once_per_handle() {
    let (mem, store, artifact) = setup();
    store
        .save_model_document(&ModelDocument::constant(Label::Positive), &artifact)
        .await
        .unwrap();

    let handle = ModelHandle::new(store, artifact);
    assert!(!handle.is_loaded());
    for _ in 0..3 {
        assert_eq!(handle.predict(&rows(2)).await.unwrap(), vec![Label::Positive; 2]);
    }
    assert!(handle.is_loaded());
    assert_eq!(mem.calls().get, 1);
}

#[tokio::test]
async fn warm_handle_survives_overwrite_fresh_handle_sees_new_model() {
    let (_mem, store, artifact) = setup();
    store
        .save_model_document(&ModelDocument::constant(Label::Negative), &artifact)
        .await
        .unwrap();

    let warm = ModelHandle::new(store.clone(), artifact.clone());
    assert_eq!(warm.predict(&rows(1)).await.unwrap(), vec![Label::Negative]);

    store
        .save_model_document(&ModelDocument::constant(Label::Positive), &artifact)
        .await
        .unwrap();

    assert_eq!(warm.predict(&rows(1)).await.unwrap(), vec![Label::Negative]);
    let fresh = ModelHandle::new(store, artifact);
    assert_eq!(fresh.predict(&rows(1)).await.unwrap(), vec![Label::Positive]);
}

#[tokio::test]
async fn load_failures_surface_and_are_not_cached() {
    let (mem, store, artifact) = setup();
    let handle = ModelHandle::new(store, artifact.clone());

    let err = handle.predict(&rows(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!handle.is_loaded());

    mem.insert(&artifact.bucket, &artifact.key, b"not a model".to_vec());
    let err = handle.predict(&rows(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Deserialization);

    mem.insert(&artifact.bucket, &artifact.key, br#"{"family":"constant","label":1}"#.to_vec());
    assert_eq!(handle.predict(&rows(1)).await.unwrap(), vec![Label::Positive]);
}
