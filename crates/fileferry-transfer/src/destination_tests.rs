use super::*;

use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> S3Config {
    S3Config {
        endpoint: server.uri(),
        bucket: "archive".to_string(),
        access_key_id: "test-key".to_string(),
        secret_access_key: "test-secret".to_string(),
        region: "us-east-1".to_string(),
    }
}

#[tokio::test]
async fn test_store_uploads_file_body() {
    let mock_server = MockServer::start().await;
    let body = b"date,open,close\n2024-01-02,1.0,2.0\n";

    Mock::given(method("PUT"))
        .and(path("/archive/us_stocks_sip/day_aggs_v1/2024/2024-01-02.csv.gz"))
        .and(body_bytes(body.as_slice()))
        .respond_with(ResponseTemplate::new(200).append_header("etag", "\"u1\""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("2024-01-02.csv.gz");
    tokio::fs::write(&local, body).await.unwrap();

    let destination = S3Destination::new(&test_config(&mock_server)).unwrap();
    destination
        .store(&local, "us_stocks_sip/day_aggs_v1/2024/2024-01-02.csv.gz")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_store_missing_local_file_is_io_error() {
    let mock_server = MockServer::start().await;
    let destination = S3Destination::new(&test_config(&mock_server)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = destination
        .store(&dir.path().join("never-written.csv.gz"), "k")
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Io(_)));
}

#[tokio::test]
async fn test_store_surfaces_rejected_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/archive/k"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("k");
    tokio::fs::write(&local, b"x").await.unwrap();

    let destination = S3Destination::new(&test_config(&mock_server)).unwrap();
    let stored = destination.store(&local, "k").await;
    assert!(matches!(stored, Err(TransferError::ObjectStore(_))));
}
