//! Registry store contract tests
//!
//! Exercises the durable store's public contract end to end against real
//! files: uniqueness, merge-update semantics, silent deletes, search, and
//! the concurrent-create race.
//!
//! If these fail, the registry's core guarantees are broken.

use std::collections::HashMap;
use std::sync::Arc;

use subreg_core::record::{NewRecord, RecordPatch};
use subreg_core::store::FileRegistryStore;
use subreg_core::traits::RegistryStore;
use subreg_core::{ConfigPatch, Error};
use tempfile::tempdir;

fn fields(target: &str) -> NewRecord {
    NewRecord {
        target: Some(target.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    let created = store.create("shop", "com", fields("1.2.3.4")).await.unwrap();
    assert_eq!(created.created_at, created.updated_at);

    let fetched = store.get("shop", "com").await.unwrap().unwrap();
    assert_eq!(fetched.subdomain, "shop");
    assert_eq!(fetched.tld, "com");
    assert_eq!(fetched.target, "1.2.3.4");
    assert_eq!(fetched.record_type, "A");
    assert!(fetched.ssl_enabled);
    assert_eq!(fetched.status, "active");
    assert!(fetched.metadata.is_empty());
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn second_create_fails_and_leaves_first_unmodified() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    let first = store.create("shop", "com", fields("1.2.3.4")).await.unwrap();

    let err = store
        .create("shop", "com", fields("5.6.7.8"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));

    let fetched = store.get("shop", "com").await.unwrap().unwrap();
    assert_eq!(fetched, first);
}

#[tokio::test]
async fn update_on_absent_key_fails_without_creating() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    let patch = RecordPatch {
        target: Some("5.6.7.8".to_string()),
        ..Default::default()
    };
    let err = store.update("ghost", "net", patch).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(store.get("ghost", "net").await.unwrap().is_none());
}

#[tokio::test]
async fn status_patch_changes_only_status_and_updated_at() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    let before = store.create("shop", "com", fields("1.2.3.4")).await.unwrap();

    let patch = RecordPatch {
        status: Some("paused".to_string()),
        ..Default::default()
    };
    let after = store.update("shop", "com", patch).await.unwrap();

    assert_eq!(after.status, "paused");
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.subdomain, before.subdomain);
    assert_eq!(after.tld, before.tld);
    assert_eq!(after.target, before.target);
    assert_eq!(after.record_type, before.record_type);
    assert_eq!(after.ssl_enabled, before.ssl_enabled);
    assert_eq!(after.metadata, before.metadata);
    assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn delete_then_get_returns_absent() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    store.create("shop", "com", fields("1.2.3.4")).await.unwrap();

    assert!(store.delete("shop", "com").await.unwrap());
    assert!(store.get("shop", "com").await.unwrap().is_none());

    // Second delete is silent, not an error
    assert!(!store.delete("shop", "com").await.unwrap());
}

#[tokio::test]
async fn search_matches_keys_and_field_values() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    store.create("abcshop", "com", fields("1.1.1.1")).await.unwrap();
    store.create("blog", "net", fields("the-abc-box")).await.unwrap();
    store.create("mail", "dev", fields("2.2.2.2")).await.unwrap();

    let hits = store.search("ABC").await.unwrap();
    let keys: Vec<String> = hits.iter().map(|record| record.key()).collect();
    assert_eq!(keys, vec!["abcshop.com".to_string(), "blog.net".to_string()]);
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    // create
    store.create("shop", "com", fields("1.2.3.4")).await.unwrap();
    let record = store.get("shop", "com").await.unwrap().unwrap();
    assert_eq!(record.subdomain, "shop");
    assert_eq!(record.tld, "com");
    assert_eq!(record.target, "1.2.3.4");
    assert_eq!(record.record_type, "A");
    assert!(record.ssl_enabled);
    assert_eq!(record.status, "active");
    assert_eq!(record.metadata, HashMap::new());

    // duplicate create fails
    let err = store
        .create("shop", "com", NewRecord::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));

    // partial update
    let patch = RecordPatch {
        target: Some("5.6.7.8".to_string()),
        ..Default::default()
    };
    store.update("shop", "com", patch).await.unwrap();
    let record = store.get("shop", "com").await.unwrap().unwrap();
    assert_eq!(record.target, "5.6.7.8");
    assert_eq!(record.record_type, "A");

    // delete
    assert!(store.delete("shop", "com").await.unwrap());
    assert!(store.get("shop", "com").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_creates_of_same_key_admit_exactly_one() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileRegistryStore::new(dir.path()).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.create("shop", "com", fields(&format!("10.0.0.{i}"))).await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(Error::AlreadyExists(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one create may succeed");
    assert_eq!(conflicts, 15, "all others must observe AlreadyExists");
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_updates_do_not_lose_writes() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileRegistryStore::new(dir.path()).await.unwrap());

    for i in 0..8 {
        store
            .create(&format!("host-{i}"), "net", fields("0.0.0.0"))
            .await
            .unwrap();
    }

    // Each task pauses a different record; all eight changes must survive
    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let patch = RecordPatch {
                status: Some("paused".to_string()),
                ..Default::default()
            };
            store.update(&format!("host-{i}"), "net", patch).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = store.get_all().await.unwrap();
    assert_eq!(records.len(), 8);
    assert!(records.values().all(|record| record.status == "paused"));
}

#[tokio::test]
async fn config_round_trip_and_merge() {
    let dir = tempdir().unwrap();
    let store = FileRegistryStore::new(dir.path()).await.unwrap();

    let config = store.get_config().await.unwrap();
    assert!(config.auto_dns);

    store
        .update_config(ConfigPatch {
            auto_dns: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();

    // Survives a reopen and keeps unspecified fields
    let store = FileRegistryStore::new(dir.path()).await.unwrap();
    let config = store.get_config().await.unwrap();
    assert!(!config.auto_dns);
    assert!(config.ssl_enabled);
    assert_eq!(config.default_target, "0.0.0.0");
}
