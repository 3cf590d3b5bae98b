//! Remote Archive Integration Tests
//!
//! Runs the HTTP archive client against a wiremock server, directly and
//! through model promotion.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use common::{bearer_auth, build_test_app, glb_bytes, token_for};
use modelvault::models::ModelUpload;
use modelvault::services::{
    ArchiveRecord, HttpModelArchive, LocalModelStore, ModelArchive, ModelLibrary, Thumbnail,
};
use modelvault::Error;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn archive_for(server: &MockServer, api_key: Option<&str>) -> HttpModelArchive {
    HttpModelArchive::new(
        &server.uri(),
        api_key.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn record(name: &str) -> ArchiveRecord {
    ArchiveRecord {
        name: name.to_string(),
        model_url: format!("https://cdn.example/{}", name),
        model_path: format!("u1/model/1_{}", name),
        thumbnail_url: None,
        thumbnail_path: None,
        user_id: "u1".to_string(),
        created_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn test_upload_puts_bytes_and_returns_url() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/objects/u1%2Fmodel%2F1_chair.glb"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "https://cdn.example/chair" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let archive = archive_for(&server, None);
    let url = archive
        .upload(glb_bytes(), "u1/model/1_chair.glb")
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.example/chair");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, glb_bytes());
}

#[tokio::test]
async fn test_record_metadata_posts_json_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .and(body_partial_json(json!({ "name": "chair.glb", "userId": "u1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "rec-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let archive = archive_for(&server, None);
    let id = archive.record_metadata(record("chair.glb")).await.unwrap();

    assert_eq!(id, "rec-123");
}

#[tokio::test]
async fn test_api_key_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .and(header("authorization", "Bearer archive-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "rec-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let archive = archive_for(&server, Some("archive-key"));
    assert_eq!(
        archive.record_metadata(record("a.glb")).await.unwrap(),
        "rec-1"
    );
}

#[tokio::test]
async fn test_server_error_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bucket unavailable"))
        .mount(&server)
        .await;

    let archive = archive_for(&server, None);
    let err = archive.upload(vec![1, 2, 3], "u1/model/1_a.glb").await.unwrap_err();

    assert!(matches!(err, Error::Remote(_)));
}

#[tokio::test]
async fn test_malformed_response_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let archive = archive_for(&server, None);
    let err = archive.record_metadata(record("a.glb")).await.unwrap_err();

    assert!(matches!(err, Error::Remote(_)));
}

#[tokio::test]
async fn test_promote_uploads_model_thumbnail_and_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/objects/u1%2Fmodel%2F\d+_chair\.glb$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "https://cdn.example/model" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/objects/u1%2Fthumbnail%2F\d+_chair\.png$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "https://cdn.example/thumb" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .and(body_partial_json(json!({
            "name": "chair.glb",
            "modelUrl": "https://cdn.example/model",
            "thumbnailUrl": "https://cdn.example/thumb",
            "userId": "u1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "rec-9" })))
        .expect(1)
        .mount(&server)
        .await;

    let library = ModelLibrary::new(
        LocalModelStore::in_memory().await.unwrap(),
        Some(Arc::new(archive_for(&server, None)) as Arc<dyn ModelArchive>),
    );
    let model = library
        .upload(
            ModelUpload::new("chair.glb", "model/gltf-binary", glb_bytes()),
            "u1",
        )
        .await
        .unwrap();

    let promoted = library
        .promote(
            model.id,
            "u1",
            Some(Thumbnail {
                name: "chair.png".into(),
                data: vec![0x89, b'P', b'N', b'G'],
            }),
        )
        .await
        .unwrap();

    assert_eq!(promoted.record_id, "rec-9");
    assert_eq!(promoted.model_url, "https://cdn.example/model");
    assert_eq!(promoted.thumbnail_url.as_deref(), Some("https://cdn.example/thumb"));
    assert!(promoted.model_path.starts_with("u1/model/"));
}

#[tokio::test]
async fn test_promote_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "url": "https://cdn.example/m" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "rec-http" })))
        .mount(&server)
        .await;

    let archive: Arc<dyn ModelArchive> = Arc::new(archive_for(&server, None));
    let (app, state) = build_test_app(Some(archive)).await;
    let model = state
        .library
        .upload(ModelUpload::new("a.glb", "", glb_bytes()), "u1")
        .await
        .unwrap();

    let response = app
        .post(&format!("/models/{}/promote", model.id))
        .add_header(AUTHORIZATION, bearer_auth(&token_for("u1")))
        .json(&json!({}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recordId"], "rec-http");
    assert_eq!(body["modelUrl"], "https://cdn.example/m");
    assert!(body["thumbnailUrl"].is_null());
}

#[tokio::test]
async fn test_failed_promotion_keeps_local_model() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let archive: Arc<dyn ModelArchive> = Arc::new(archive_for(&server, None));
    let (app, state) = build_test_app(Some(archive)).await;
    let model = state
        .library
        .upload(ModelUpload::new("a.glb", "", glb_bytes()), "u1")
        .await
        .unwrap();

    let response = app
        .post(&format!("/models/{}/promote", model.id))
        .add_header(AUTHORIZATION, bearer_auth(&token_for("u1")))
        .json(&json!({}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    assert!(state.library.store().get(model.id).await.unwrap().is_some());
}

fn record_json(id: &str, name: &str, user_id: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "modelUrl": format!("https://cdn.example/{}", name),
        "modelPath": format!("{}/model/1_{}", user_id, name),
        "userId": user_id,
        "createdAt": created_at
    })
}

#[tokio::test]
async fn test_list_records_queries_by_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("userId", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [record_json("rec-1", "chair.glb", "u1", "2024-05-01T10:00:00Z")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let archive = archive_for(&server, None);
    let records = archive.list_records("u1").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "rec-1");
    assert_eq!(records[0].record.name, "chair.glb");
    assert_eq!(records[0].record.model_url, "https://cdn.example/chair.glb");
}

#[tokio::test]
async fn test_archived_listing_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .and(query_param("userId", "u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                record_json("rec-old", "old.glb", "u1", "2024-01-01T00:00:00Z"),
                record_json("rec-foreign", "foreign.glb", "u2", "2024-06-01T00:00:00Z"),
                record_json("rec-new", "new.glb", "u1", "2024-05-01T00:00:00Z")
            ]
        })))
        .mount(&server)
        .await;

    let archive: Arc<dyn ModelArchive> = Arc::new(archive_for(&server, None));
    let (app, _state) = build_test_app(Some(archive)).await;

    let response = app
        .get("/models/archived")
        .add_header(AUTHORIZATION, bearer_auth(&token_for("u1")))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["models"][0]["id"], "rec-new");
    assert_eq!(body["models"][0]["userId"], "u1");
    assert_eq!(body["models"][1]["id"], "rec-old");
}

#[tokio::test]
async fn test_archived_listing_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let archive: Arc<dyn ModelArchive> = Arc::new(archive_for(&server, None));
    let (app, _state) = build_test_app(Some(archive)).await;

    let response = app
        .get("/models/archived")
        .add_header(AUTHORIZATION, bearer_auth(&token_for("u1")))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "REMOTE_ERROR");
}
