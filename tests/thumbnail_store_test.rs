//! Thumbnail mapping persistence across restarts

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use teloxide::types::UserId;

use rethumb::core::types::ThumbnailRef;
use rethumb::storage::ThumbnailStore;

#[tokio::test]
async fn test_existing_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thumbnails.json");
    std::fs::write(&path, r#"{"42": "ref-A"}"#).unwrap();

    let store = ThumbnailStore::load(&path).await.unwrap();

    assert_eq!(store.get(UserId(42)).await, Some(ThumbnailRef::new("ref-A")));
    assert_eq!(store.get(UserId(43)).await, None);
}

#[tokio::test]
async fn test_mapping_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("thumbnails.json");

    {
        let store = ThumbnailStore::load(&path).await.unwrap();
        store.set(UserId(42), ThumbnailRef::new("ref-A")).await.unwrap();
        store.set(UserId(7), ThumbnailRef::new("ref-B")).await.unwrap();
        store.set(UserId(42), ThumbnailRef::new("ref-C")).await.unwrap();
    }

    let reloaded = ThumbnailStore::load(&path).await.unwrap();
    assert_eq!(reloaded.len().await, 2);
    assert_eq!(reloaded.get(UserId(42)).await, Some(ThumbnailRef::new("ref-C")));
    assert_eq!(reloaded.get(UserId(7)).await, Some(ThumbnailRef::new("ref-B")));
}

#[tokio::test]
async fn test_empty_file_is_an_empty_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thumbnails.json");
    std::fs::write(&path, "").unwrap();

    let store = ThumbnailStore::load(&path).await.unwrap();
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_sets_all_persist() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("thumbnails.json");
    let store = std::sync::Arc::new(ThumbnailStore::load(&path).await.unwrap());

    let handles: Vec<_> = (1..=20u64)
        .map(|user| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .set(UserId(user), ThumbnailRef::new(format!("ref-{}", user)))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let reloaded = ThumbnailStore::load(&path).await.unwrap();
    assert_eq!(reloaded.len().await, 20);
    assert_eq!(reloaded.get(UserId(13)).await, Some(ThumbnailRef::new("ref-13")));
}
