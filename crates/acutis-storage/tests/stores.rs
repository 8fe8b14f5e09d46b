use acutis_storage::error::StorageError;
use acutis_storage::fs::FsStore;
use acutis_storage::{ObjectStore, state};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Counter {
    value: u32,
}

fn stores() -> (Vec<ObjectStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let stores = vec![
        ObjectStore::memory(),
        ObjectStore::Filesystem(FsStore::new(dir.path())),
    ];
    (stores, dir)
}

#[tokio::test]
async fn round_trips_state_and_lists_by_prefix() {
    let (stores, _dir) = stores();
    for store in stores {
        state::save_state(&store, "sessions/a.json", &Counter { value: 1 })
            .await
            .unwrap();
        state::save_state(&store, "sessions/b.json", &Counter { value: 2 })
            .await
            .unwrap();
        state::save_state(&store, "templates/t.json", &Counter { value: 3 })
            .await
            .unwrap();

        let (loaded, etag): (Counter, String) =
            state::load_state(&store, "sessions/b.json").await.unwrap();
        assert_eq!(loaded, Counter { value: 2 });
        assert!(!etag.is_empty());

        let keys = store.list_objects("sessions/").await.unwrap();
        assert_eq!(keys, ["sessions/a.json", "sessions/b.json"]);
    }
}

#[tokio::test]
async fn missing_objects_are_not_found() {
    let (stores, _dir) = stores();
    for store in stores {
        let err = store.get_object("sessions/missing.json").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));

        let loaded: Option<(Counter, String)> =
            state::load_state_opt(&store, "sessions/missing.json").await.unwrap();
        assert!(loaded.is_none());

        store.delete_object("sessions/missing.json").await.unwrap();
    }
}

#[tokio::test]
async fn stale_etag_is_rejected() {
    let (stores, _dir) = stores();
    for store in stores {
        let first = state::save_state(&store, "k.json", &Counter { value: 1 })
            .await
            .unwrap();
        let second = state::save_state_if_match(&store, "k.json", &Counter { value: 2 }, &first)
            .await
            .unwrap();

        let err = state::save_state_if_match(&store, "k.json", &Counter { value: 3 }, &first)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PreconditionFailed { .. }));

        state::save_state_if_match(&store, "k.json", &Counter { value: 3 }, &second)
            .await
            .unwrap();
        let (loaded, _): (Counter, String) = state::load_state(&store, "k.json").await.unwrap();
        assert_eq!(loaded.value, 3);
    }
}

#[tokio::test]
async fn filesystem_rejects_escaping_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = ObjectStore::Filesystem(FsStore::new(dir.path()));
    let err = store
        .put_object("../outside.json", b"{}".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey { .. }));
}

#[tokio::test]
async fn load_all_skips_unreadable_objects() {
    let store = ObjectStore::memory();
    state::save_state(&store, "templates/good.json", &Counter { value: 7 })
        .await
        .unwrap();
    store
        .put_object("templates/bad.json", b"not json".to_vec(), None)
        .await
        .unwrap();

    let loaded: Vec<(Counter, String)> = state::load_all(&store, "templates/").await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].0.value, 7);
}
