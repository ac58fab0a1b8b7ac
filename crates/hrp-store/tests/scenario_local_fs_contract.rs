//! Registry contract over the directory backend: prefix existence, folder
//! markers, upload-then-delete.

use std::sync::Arc;

use hrp_store::{Connection, FolderStatus, LocalFsObjectStore, MemoryObjectStore, StoreOp};

fn local_conn(root: &std::path::Path) -> Connection {
    Connection::new(Arc::new(LocalFsObjectStore::new(root)))
}

#[tokio::test]
async fn write_file_keeps_local_copy_by_default() {
    let store_dir = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let model = work.path().join("model.json");
    std::fs::write(&model, b"{\"family\":\"constant\",\"label\":1}").unwrap();

    let conn = local_conn(store_dir.path());
    conn.write_file(&model, "b", "model-registry/model.json", false)
        .await
        .unwrap();

    assert!(model.exists());
    assert_eq!(
        conn.read("b", "model-registry/model.json").await.unwrap(),
        std::fs::read(&model).unwrap()
    );
}

#[tokio::test]
async fn write_file_deletes_local_only_after_upload() {
    let store_dir = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let model = work.path().join("model.json");
    std::fs::write(&model, b"v1").unwrap();

    let conn = local_conn(store_dir.path());
    conn.write_file(&model, "b", "model-registry/model.json", true)
        .await
        .unwrap();
    assert!(!model.exists());
    assert!(conn.exists("b", "model-registry/model.json").await.unwrap());
}

#[tokio::test]
async fn failed_upload_keeps_local_file() {
    let work = tempfile::tempdir().unwrap();
    let model = work.path().join("model.json");
    std::fs::write(&model, b"v1").unwrap();

    let mem = Arc::new(MemoryObjectStore::new());
    mem.fail_on(StoreOp::Put);
    let conn = Connection::new(mem.clone());

    let err = conn
        .write_file(&model, "b", "model-registry/model.json", true)
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "STORAGE");
    assert!(model.exists());
    assert!(mem.is_empty());
}

#[tokio::test]
async fn missing_local_file_is_storage_error() {
    let conn = Connection::new(Arc::new(MemoryObjectStore::new()));
    let err = conn
        .write_file(std::path::Path::new("/nonexistent/hrp/model.json"), "b", "k", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "STORAGE");
}

#[tokio::test]
async fn folder_marker_roundtrip_on_disk() {
    let store_dir = tempfile::tempdir().unwrap();
    let conn = local_conn(store_dir.path());

    assert_eq!(
        conn.ensure_folder("b", "model-registry").await.unwrap(),
        FolderStatus::Created
    );
    assert_eq!(
        conn.ensure_folder("b", "model-registry").await.unwrap(),
        FolderStatus::Existed
    );
    assert!(conn.exists("b", "model-registry/").await.unwrap());
    assert!(conn.read("b", "model-registry/").await.unwrap().is_empty());
}

#[tokio::test]
async fn read_missing_is_not_found() {
    let store_dir = tempfile::tempdir().unwrap();
    let conn = local_conn(store_dir.path());
    let err = conn.read("b", "model-registry/model.json").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!conn.exists("b", "model-registry/model.json").await.unwrap());
}
