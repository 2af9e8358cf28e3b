//! Reload coordinator and flat-file store integration

use rbac_authz::{
    Enforcer, FileTupleStore, MemoryTupleStore, RbacError, RoleAssignment, Tuple, TupleStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_in_flight_reader_keeps_its_snapshot() {
    let store = Arc::new(MemoryTupleStore::new());
    let enforcer = Enforcer::new(store.clone()).await.unwrap();
    enforcer.add_policy("admin", "root", "data1", "write").await.unwrap();

    // snapshot N pinned by a long-running reader
    let snapshot_n = enforcer.snapshot();

    store.insert_external(Tuple::from(RoleAssignment::new("alice", "admin", "root")));
    enforcer.reload().await.unwrap();

    assert!(!snapshot_n.enforce("alice", "root", "data1", "write"));
    assert!(enforcer.enforce("alice", "root", "data1", "write"));
    assert!(!Arc::ptr_eq(&snapshot_n, &enforcer.snapshot()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_regression_during_reloads() {
    let store = Arc::new(MemoryTupleStore::new());
    let enforcer = Arc::new(Enforcer::new(store.clone()).await.unwrap());
    enforcer.add_policy("admin", "root", "data1", "read").await.unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let enforcer = enforcer.clone();
            let done = done.clone();
            tokio::spawn(async move {
                let mut last_seen = 0;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = enforcer.snapshot();
                    let granted = (0..50)
                        .filter(|i| snapshot.enforce(&format!("u{}", i), "root", "data1", "read"))
                        .count();
                    assert_eq!(granted, snapshot.stats().assignments);
                    assert!(granted >= last_seen);
                    last_seen = granted;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for i in 0..50 {
        store.insert_external(Tuple::from(RoleAssignment::new(format!("u{}", i), "admin", "root")));
        enforcer.reload().await.unwrap();
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(enforcer.stats().assignments, 50);
}

#[tokio::test]
async fn test_reload_failure_serves_stale_snapshot() {
    let store = Arc::new(MemoryTupleStore::new());
    let enforcer = Enforcer::new(store.clone()).await.unwrap();
    enforcer.add_policy("admin", "root", "data1", "write").await.unwrap();
    enforcer.add_role_assignment("alice", "admin", "root").await.unwrap();

    store.set_unavailable(true);
    let err = enforcer.reload().await.unwrap_err();
    assert!(matches!(err, RbacError::StoreUnavailable(_)));
    assert!(enforcer.enforce("alice", "root", "data1", "write"));

    store.set_unavailable(false);
    enforcer.reload().await.unwrap();
    assert!(enforcer.enforce("alice", "root", "data1", "write"));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.csv");

    {
        let enforcer = Enforcer::new(Arc::new(FileTupleStore::new(&path))).await.unwrap();
        enforcer.add_policy("admin", "root", "data1", "write").await.unwrap();
        enforcer.add_role_assignment("alice", "admin", "root").await.unwrap();
        enforcer.add_subdomain_link("root", "team").await.unwrap();
    }

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "p, admin, root, data1, write\ng, alice, admin, root\ng2, team, root\n"
    );

    let enforcer = Enforcer::new(Arc::new(FileTupleStore::new(&path))).await.unwrap();
    assert!(enforcer.enforce("alice", "team", "data1", "write"));

    enforcer.delete_domain("team").await.unwrap();
    let reloaded = FileTupleStore::new(&path).load_all().await.unwrap();
    assert_eq!(reloaded.len(), 2);
}

#[tokio::test]
async fn test_file_edits_picked_up_by_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.csv");
    std::fs::write(&path, "p, admin, root, data1, write\n").unwrap();

    let enforcer = Enforcer::new(Arc::new(FileTupleStore::new(&path))).await.unwrap();
    assert!(!enforcer.enforce("bob", "root", "data1", "write"));

    std::fs::write(&path, "p, admin, root, data1, write\ng, bob, admin, root\n").unwrap();
    enforcer.reload().await.unwrap();
    assert!(enforcer.enforce("bob", "root", "data1", "write"));

    // malformed edit: reload fails, previous snapshot keeps serving
    std::fs::write(&path, "p, admin, root\n").unwrap();
    let err = enforcer.reload().await.unwrap_err();
    assert!(matches!(err, RbacError::Validation(_)));
    assert!(enforcer.enforce("bob", "root", "data1", "write"));
}

#[tokio::test]
async fn test_cyclic_store_data_fails_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.csv");
    std::fs::write(&path, "g2, a, b\n").unwrap();

    let enforcer = Enforcer::new(Arc::new(FileTupleStore::new(&path))).await.unwrap();
    std::fs::write(&path, "g2, a, b\ng2, b, a\n").unwrap();

    let err = tokio::time::timeout(Duration::from_secs(5), enforcer.reload())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, RbacError::Cycle(_)));
    assert_eq!(enforcer.stats().subdomain_links, 1);
}
