//! Reconciliation Tests
//!
//! Session-start merge of the local cache and the canonical store into the
//! working view.

mod common;

use beelab::experiment::ExperimentView;
use beelab::reconcile::{reconcile, RemoteDecision};
use beelab::store::{ExperimentCache, ExperimentStore, LocalStore};

use common::{experiment, memory_store, ReadOnlyCache, UnreachableStore};

#[tokio::test]
async fn test_remote_collection_wins() {
    let local = memory_store();
    let remote = memory_store();
    local.put(&experiment("A", 1)).await.unwrap();
    remote.put(&experiment("B", 2)).await.unwrap();
    remote.put(&experiment("C", 3)).await.unwrap();
    let view = ExperimentView::new();

    let report = reconcile(&local, &remote, &view).await;

    assert_eq!(view.ids(), vec!["B", "C"]);
    let cached: Vec<String> = local
        .list()
        .await
        .unwrap()
        .iter()
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(cached, vec!["B", "C"]);
    assert_eq!(report.local_count, 1);
    assert_eq!(report.remote, RemoteDecision::Applied { count: 2 });
    assert_eq!(report.dropped_local, vec!["A"]);
    assert!(report.local_mirrored);
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let local = memory_store();
    let remote = memory_store();
    local.put(&experiment("A", 1)).await.unwrap();
    remote.put(&experiment("B", 2)).await.unwrap();
    let view = ExperimentView::new();

    reconcile(&local, &remote, &view).await;
    let first = view.snapshot();
    let second_report = reconcile(&local, &remote, &view).await;

    assert_eq!(*view.snapshot(), *first);
    assert!(second_report.dropped_local.is_empty());
    assert_eq!(local.list().await.unwrap(), remote.list().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_remote_keeps_local_view() {
    let local = memory_store();
    local.put(&experiment("A", 1)).await.unwrap();
    local.put(&experiment("B", 2)).await.unwrap();
    let view = ExperimentView::new();

    let report = reconcile(&local, &UnreachableStore, &view).await;

    assert_eq!(view.ids(), vec!["A", "B"]);
    assert!(matches!(report.remote, RemoteDecision::Unreachable(_)));
    assert!(!report.local_mirrored);
    assert_eq!(local.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_remote_keeps_local_view() {
    let local = memory_store();
    local.put(&experiment("A", 1)).await.unwrap();
    let view = ExperimentView::new();

    let report = reconcile(&local, &memory_store(), &view).await;

    assert_eq!(view.ids(), vec!["A"]);
    assert_eq!(report.remote, RemoteDecision::Empty);
    assert_eq!(local.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_everywhere_leaves_view_empty() {
    let view = ExperimentView::new();
    let report = reconcile(&memory_store(), &memory_store(), &view).await;
    assert!(view.is_empty());
    assert_eq!(report.local_count, 0);
}

#[tokio::test]
async fn test_mirror_failure_still_updates_view() {
    let local = ReadOnlyCache::with(vec![experiment("A", 1)]);
    let remote = memory_store();
    remote.put(&experiment("B", 2)).await.unwrap();
    let view = ExperimentView::new();

    let report = reconcile(&local, &remote, &view).await;

    assert_eq!(view.ids(), vec!["B"]);
    assert!(!report.local_mirrored);
    assert!(local.replace_all(&[]).await.is_err());
}

#[tokio::test]
async fn test_disk_cache_mirrors_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let remote = memory_store();
    remote.put(&experiment("B", 2)).await.unwrap();
    remote.put(&experiment("C", 3)).await.unwrap();

    {
        let local = LocalStore::open(dir.path()).await.unwrap();
        local.put(&experiment("A", 1)).await.unwrap();
        reconcile(&local, &remote, &ExperimentView::new()).await;
    }

    let reopened = LocalStore::open(dir.path()).await.unwrap();
    let ids: Vec<String> = reopened
        .list()
        .await
        .unwrap()
        .iter()
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(ids, vec!["B", "C"]);
}
