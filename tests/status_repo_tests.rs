// StatusRepo tests: init, upsert, insert, retention, latest-per-client

mod common;

use common::{minimal_form, temp_repo};
use std::sync::Arc;

#[tokio::test]
async fn status_repo_connect_and_init() {
    let (_dir, repo) = temp_repo(10).await;
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert_eq!(repo.client_count().await.unwrap(), 0);
}

#[tokio::test]
async fn upsert_client_creates_then_renames() {
    let (_dir, repo) = temp_repo(10).await;

    let id = repo.upsert_client("m1", "A").await.unwrap();
    let again = repo.upsert_client("m1", "B").await.unwrap();
    assert_eq!(id, again);
    assert_eq!(repo.client_count().await.unwrap(), 1);

    let client = repo.find_client("m1").await.unwrap().unwrap();
    assert_eq!(client.id, id);
    assert_eq!(client.name, "B");

    let other = repo.upsert_client("m2", "C").await.unwrap();
    assert_ne!(other, id);
    assert!(repo.find_client("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_first_upserts_create_one_client() {
    let (_dir, repo) = temp_repo(10).await;
    let repo = Arc::new(repo);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move {
                let report = minimal_form("race", &format!("n{i}")).normalize();
                repo.record_snapshot(&report, 1000 + i).await.unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for h in handles {
        ids.push(h.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(repo.client_count().await.unwrap(), 1);
    assert_eq!(repo.snapshot_count(ids[0]).await.unwrap(), 16);
}

#[tokio::test]
async fn retention_keeps_newest_k_per_client() {
    let (_dir, repo) = temp_repo(3).await;
    let report = minimal_form("m1", "A").normalize();

    let mut inserted = Vec::new();
    for ts in [50, 10, 40, 20, 30] {
        let client_id = repo.upsert_client("m1", "A").await.unwrap();
        inserted.push((ts, repo.insert_snapshot(client_id, &report, ts).await.unwrap()));
    }
    let sweep = repo.enforce_retention().await.unwrap();
    assert_eq!(sweep.snapshots_deleted, 2);
    assert_eq!(sweep.clients_deleted, 0);

    let client = repo.find_client("m1").await.unwrap().unwrap();
    let mut expected: Vec<_> = inserted.iter().filter(|(ts, _)| *ts >= 30).collect();
    expected.sort_by_key(|(ts, _)| std::cmp::Reverse(*ts));
    let expected_ids: Vec<i64> = expected.iter().map(|(_, id)| *id).collect();
    assert_eq!(repo.snapshot_ids(client.id).await.unwrap(), expected_ids);
}

#[tokio::test]
async fn retention_breaks_timestamp_ties_by_id() {
    let (_dir, repo) = temp_repo(2).await;
    let report = minimal_form("m1", "A").normalize();
    let client_id = repo.upsert_client("m1", "A").await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(repo.insert_snapshot(client_id, &report, 1000).await.unwrap());
    }
    repo.enforce_retention().await.unwrap();
    assert_eq!(repo.snapshot_ids(client_id).await.unwrap(), vec![ids[3], ids[2]]);
}

#[tokio::test]
async fn snapshot_count_is_min_of_ingestions_and_cap() {
    let (_dir, repo) = temp_repo(4).await;

    for n in 1..=7i64 {
        let report = minimal_form("m1", "A").normalize();
        let client_id = repo.record_snapshot(&report, n).await.unwrap();
        repo.enforce_retention().await.unwrap();
        assert_eq!(repo.snapshot_count(client_id).await.unwrap(), n.min(4));
    }
}

#[tokio::test]
async fn retention_is_scoped_per_client() {
    let (_dir, repo) = temp_repo(2).await;
    for ts in 0..5 {
        repo.record_snapshot(&minimal_form("busy", "A").normalize(), ts)
            .await
            .unwrap();
    }
    let quiet = repo
        .record_snapshot(&minimal_form("quiet", "B").normalize(), 0)
        .await
        .unwrap();
    repo.enforce_retention().await.unwrap();

    let busy = repo.find_client("busy").await.unwrap().unwrap();
    assert_eq!(repo.snapshot_count(busy.id).await.unwrap(), 2);
    assert_eq!(repo.snapshot_count(quiet).await.unwrap(), 1);
}

#[tokio::test]
async fn retention_is_idempotent() {
    let (_dir, repo) = temp_repo(2).await;
    for ts in 0..6 {
        repo.record_snapshot(&minimal_form("m1", "A").normalize(), ts)
            .await
            .unwrap();
        repo.record_snapshot(&minimal_form("m2", "B").normalize(), ts)
            .await
            .unwrap();
    }

    let first = repo.enforce_retention().await.unwrap();
    assert_eq!(first.snapshots_deleted, 8);
    let before = repo.latest_per_client().await.unwrap();

    let second = repo.enforce_retention().await.unwrap();
    assert_eq!(second.snapshots_deleted, 0);
    assert_eq!(second.clients_deleted, 0);
    assert_eq!(repo.latest_per_client().await.unwrap(), before);
    assert_eq!(repo.client_count().await.unwrap(), 2);
}

#[tokio::test]
async fn retention_removes_clients_without_snapshots() {
    let (_dir, repo) = temp_repo(10).await;
    repo.upsert_client("ghost", "G").await.unwrap();
    repo.record_snapshot(&minimal_form("live", "L").normalize(), 1)
        .await
        .unwrap();

    let sweep = repo.enforce_retention().await.unwrap();
    assert_eq!(sweep.clients_deleted, 1);
    assert!(repo.find_client("ghost").await.unwrap().is_none());

    let live = repo.find_client("live").await.unwrap().unwrap();
    assert_eq!(repo.client_count().await.unwrap(), 1);
    assert!(repo.snapshot_count(live.id).await.unwrap() >= 1);
}

#[tokio::test]
async fn snapshot_for_unknown_client_is_rejected() {
    let (_dir, repo) = temp_repo(10).await;
    let report = minimal_form("m1", "A").normalize();
    assert!(repo.insert_snapshot(9999, &report, 1).await.is_err());
}

#[tokio::test]
async fn latest_per_client_returns_newest_row_with_client_name() {
    let (_dir, repo) = temp_repo(10).await;
    let mut form = minimal_form("m1", "old");
    form.cpu_percent = Some("10".into());
    repo.record_snapshot(&form.normalize(), 1).await.unwrap();

    form.name = Some("new".into());
    form.cpu_percent = Some("55.5".into());
    form.location = Some("Berlin".into());
    let m1 = repo.record_snapshot(&form.normalize(), 2).await.unwrap();
    let m2 = repo
        .record_snapshot(&minimal_form("m2", "other").normalize(), 3)
        .await
        .unwrap();

    let latest = repo.latest_per_client().await.unwrap();
    assert_eq!(latest.len(), 2);

    let row = latest.iter().find(|r| r.machine_id == "m1").unwrap();
    assert_eq!(row.client_id, m1);
    assert_eq!(row.name, "new");
    assert_eq!(row.location, "Berlin");
    assert_eq!(row.insert_utc_ts, 2);
    assert_eq!(row.metrics.cpu_percent, 55.5);
    assert_eq!(row.metrics.uptime, 100);

    let row = latest.iter().find(|r| r.machine_id == "m2").unwrap();
    assert_eq!(row.client_id, m2);
    assert_eq!(row.location, "unknown");
}

#[tokio::test]
async fn latest_per_client_empty_store() {
    let (_dir, repo) = temp_repo(10).await;
    assert!(repo.latest_per_client().await.unwrap().is_empty());
}
