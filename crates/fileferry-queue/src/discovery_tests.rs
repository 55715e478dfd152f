use super::*;

use crate::sqlite::SqliteTaskStore;
use crate::store::TaskUpdate;
use crate::task::TaskStatus;

#[tokio::test]
async fn test_record_adds_new_keys() {
    let store = SqliteTaskStore::in_memory().await.unwrap();
    let gate = DiscoveryGate::new(Arc::new(store.clone()));

    let report = gate.record(["a", "b"]).await.unwrap();
    assert_eq!(report, DiscoveryReport { added: 2, skipped: 0 });
    assert_eq!(report.total(), 2);

    assert!(store.find_by_key("a").await.unwrap().is_some());
    assert!(store.find_by_key("b").await.unwrap().is_some());
}

#[tokio::test]
async fn test_record_skips_known_keys() {
    let store = SqliteTaskStore::in_memory().await.unwrap();
    let gate = DiscoveryGate::new(Arc::new(store.clone()));

    let first = gate.record(["a", "b"]).await.unwrap();
    assert_eq!(first, DiscoveryReport { added: 2, skipped: 0 });

    let second = gate.record(["a", "c"]).await.unwrap();
    assert_eq!(second, DiscoveryReport { added: 1, skipped: 1 });

    let counts = store.counts_by_status().await.unwrap();
    assert_eq!(counts, vec![(TaskStatus::Available, 3)]);
}

#[tokio::test]
async fn test_record_leaves_existing_rows_alone() {
    let store = SqliteTaskStore::in_memory().await.unwrap();
    let gate = DiscoveryGate::new(Arc::new(store.clone()));
    gate.record(["a"]).await.unwrap();

    // The task fails once before it shows up in a later discovery run.
    let task = store.find_by_key("a").await.unwrap().unwrap();
    assert_eq!(
        store
            .update_fields(task.id, None, TaskUpdate::claim("worker-1", &task))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        store
            .update_fields(
                task.id,
                Some("worker-1"),
                TaskUpdate::fail(TaskStatus::FailedDownload, "timeout"),
            )
            .await
            .unwrap(),
        1
    );

    let report = gate.record(["a"]).await.unwrap();
    assert_eq!(report, DiscoveryReport { added: 0, skipped: 1 });

    let kept = store.find_by_key("a").await.unwrap().unwrap();
    assert_eq!(kept.status, TaskStatus::FailedDownload);
    assert_eq!(kept.attempt_count, 1);
}

#[tokio::test]
async fn test_record_empty_batch() {
    let store = SqliteTaskStore::in_memory().await.unwrap();
    let gate = DiscoveryGate::new(Arc::new(store));

    let report = gate.record(Vec::<String>::new()).await.unwrap();
    assert_eq!(report, DiscoveryReport::default());
}
