use ::common::storage::BlobStore;
use server::config::{ConsistencyConfig, StorageConfig};

use crate::common::{TestApp, routes};

#[tokio::test]
async fn failed_insert_reports_502_and_leaves_orphan_blob() {
    let app = TestApp::spawn().await;
    app.metadata.fail_inserts(true);

    let res = app.upload("orphan.txt", b"bytes".to_vec(), None).await;

    assert_eq!(res.status, 502, "{}", res.text);
    assert_eq!(res.body["message"], "error");
    assert_eq!(res.body["code"], "METADATA_FAILURE");
    assert_eq!(res.body["description"], "DB insert failed");
    assert!(app.listed_names().await.is_empty());

    let report = app.get(routes::RECONCILE).await;
    assert_eq!(report.status, 200);
    assert_eq!(report.body["consistent"], false);
    let orphans = report.body["orphaned_blobs"].as_array().unwrap();
    assert_eq!(orphans.len(), 1);
    assert!(orphans[0].as_str().unwrap().ends_with("-orphan.txt"));
}

#[tokio::test]
async fn delete_succeeds_when_blob_already_gone() {
    let app = TestApp::spawn().await;
    let name = app.upload_ok("lost.txt", b"x", "").await;
    std::fs::remove_file(app.blobs.path_for(&name)).unwrap();

    let res = app.delete(&routes::delete(&name)).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["blob_removed"], false);
    assert!(app.listed_names().await.is_empty());
}

#[tokio::test]
async fn delete_of_blob_without_record_is_404_but_removes_blob() {
    let app = TestApp::spawn().await;
    app.blobs.store("stray.txt", b"stray").await.unwrap();

    let res = app.delete(&routes::delete("stray.txt")).await;

    assert_eq!(res.status, 404);
    assert!(!app.blobs.exists("stray.txt").await.unwrap());
}

#[tokio::test]
async fn rename_updates_record_when_blob_already_gone() {
    let app = TestApp::spawn().await;
    let name = app.upload_ok("lost.txt", b"x", "old").await;
    std::fs::remove_file(app.blobs.path_for(&name)).unwrap();

    let res = app.put(&routes::rename(&name, "found.txt", "new")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let list = app.get(routes::FILES).await;
    assert_eq!(list.body[0]["filename"], "found.txt");
    assert_eq!(list.body[0]["description"], "new");

    let report = app.get(routes::RECONCILE).await;
    assert_eq!(report.body["orphaned_records"], serde_json::json!(["found.txt"]));
}

#[tokio::test]
async fn download_ignores_metadata() {
    let app = TestApp::spawn().await;
    app.blobs.store("unlisted.txt", b"raw").await.unwrap();

    let res = app.download("unlisted.txt").await;

    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"raw");
    assert!(app.listed_names().await.is_empty());
}

#[tokio::test]
async fn reconcile_is_clean_after_normal_use() {
    let app = TestApp::spawn().await;
    let a = app.upload_ok("a.txt", b"a", "").await;
    app.upload_ok("b.txt", b"b", "").await;
    app.put(&routes::rename(&a, "c.txt", "")).await;

    let res = app.get(routes::RECONCILE).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["consistent"], true);
    assert_eq!(res.body["orphaned_blobs"], serde_json::json!([]));
    assert_eq!(res.body["orphaned_records"], serde_json::json!([]));
}

async fn report_lifecycle(app: &TestApp) {
    let name = app
        .upload_ok("report.pdf", b"%PDF quarterly", "Q1 report")
        .await;
    assert_eq!(app.download(&name).await.bytes, b"%PDF quarterly");

    let res = app
        .put(&routes::rename(&name, "report-final.pdf", "Q1 final"))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(app.listed_names().await, vec!["report-final.pdf".to_string()]);
    assert_eq!(app.download(&name).await.status, 404);

    let res = app.delete(&routes::delete("report-final.pdf")).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(app.listed_names().await.is_empty());
    assert_eq!(app.download("report-final.pdf").await.status, 404);

    let report = app.get(routes::RECONCILE).await;
    assert_eq!(report.body["consistent"], true);
}

#[tokio::test]
async fn report_lifecycle_end_to_end() {
    let app = TestApp::spawn().await;
    report_lifecycle(&app).await;
}

#[tokio::test]
async fn report_lifecycle_with_per_filename_serialization() {
    let consistency = ConsistencyConfig {
        serialize_per_filename: true,
        ..Default::default()
    };
    let app = TestApp::spawn_with(consistency, StorageConfig::default()).await;
    report_lifecycle(&app).await;
}

#[tokio::test]
async fn concurrent_deletes_with_serialization_have_one_winner() {
    let consistency = ConsistencyConfig {
        serialize_per_filename: true,
        ..Default::default()
    };
    let app = TestApp::spawn_with(consistency, StorageConfig::default()).await;
    let name = app.upload_ok("race.txt", b"x", "").await;

    let path = routes::delete(&name);
    let (first, second) = tokio::join!(app.delete(&path), app.delete(&path));

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [200, 404]);
    assert!(app.listed_names().await.is_empty());
}
