//! Gateway route tests (tower test utilities, no server needed)

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use docpanel_core::{CollectionStore, FileStore, MemoryStore};
use docpanel_server::{create_router, AppState, Config};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn create_test_app() -> Router {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    create_router(AppState::new(store, Config::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn insert(app: &Router, collection: &str, document: Value) -> Value {
    let (status, doc) = send(
        app,
        "POST",
        "/api/data",
        Some(json!({"collection": collection, "document": document})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "insert failed: {}", doc);
    doc
}

// Health & catalog

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_health_reports_unreachable_store() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("data");
    let store: Arc<dyn CollectionStore> = Arc::new(FileStore::open(&root).unwrap());
    std::fs::remove_dir_all(&root).unwrap();
    let app = create_router(AppState::new(store, Config::default()));

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "CONNECTION_ERROR");

    let (status, _) = send(&app, "GET", "/api/databases", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_catalog() {
    let app = create_test_app();
    insert(&app, "users", json!({"name": "ada"})).await;
    send(
        &app,
        "POST",
        "/api/data",
        Some(json!({"database": "shop", "collection": "orders", "document": {"n": 1}})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/databases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"name": "shop", "type": "memory", "collections": ["orders"]},
            {"name": "test", "type": "memory", "collections": ["users"]},
        ])
    );
}

// Listing

#[tokio::test]
async fn test_insert_then_list() {
    let app = create_test_app();
    let doc = insert(&app, "users", json!({"name": "ada", "age": 36})).await;
    let id = doc["_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);

    let (status, body) = send(&app, "GET", "/api/data?collection=users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"_id": id, "name": "ada", "age": 36}]));
}

#[tokio::test]
async fn test_list_options() {
    let app = create_test_app();
    for i in 0..4 {
        insert(&app, "nums", json!({"_id": i, "n": i})).await;
    }
    let (_, body) = send(&app, "GET", "/api/data?collection=nums&skip=1&limit=2", None).await;
    assert_eq!(body, json!([{"_id": 1, "n": 1}, {"_id": 2, "n": 2}]));

    let (_, body) = send(&app, "GET", "/api/data?collection=nums&limit=1&hide_id=true", None).await;
    assert_eq!(body, json!([{"n": 0}]));
}

#[tokio::test]
async fn test_list_requires_collection() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/api/data", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], "collection is required");
}

#[tokio::test]
async fn test_invalid_collection_name_writes_nothing() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/data",
        Some(json!({"collection": "../escape", "document": {"a": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/data",
        Some(json!({"database": "admin", "collection": "users", "document": {"a": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/databases", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_insert_requires_document() {
    let app = create_test_app();
    let (status, _) = send(&app, "POST", "/api/data", Some(json!({"collection": "c"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "POST",
        "/api/data",
        Some(json!({"collection": "c", "document": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// Updates

#[tokio::test]
async fn test_update_by_id() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": 42, "name": "old", "n": 1})).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/data/42?collection=c",
        Some(json!({"name": "new", "_id": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"_id": 42, "name": "new", "n": 1}));

    let (status, body) = send(
        &app,
        "PUT",
        "/api/data/42?collection=c",
        Some(json!({"$inc": {"n": 2}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n"], 3);
}

#[tokio::test]
async fn test_update_absent_id_is_404() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": "a"})).await;
    let (status, body) = send(&app, "PUT", "/api/data/zzz?collection=c", Some(json!({"x": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_with_id_in_body() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": "a", "v": 1})).await;
    let (status, body) = send(
        &app,
        "PUT",
        "/api/data",
        Some(json!({"collection": "c", "document": {"_id": "a", "v": 2}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"_id": "a", "v": 2}));

    let (status, _) = send(
        &app,
        "PUT",
        "/api/data",
        Some(json!({"collection": "c", "document": {"v": 3}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_update() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": 1, "v": 1})).await;
    insert(&app, "c", json!({"_id": 2, "v": 2})).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/data/bulk",
        Some(json!({
            "collection": "c",
            "documents": [{"_id": 1, "v": 10}, {"_id": 9, "v": 90}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!([{"_id": 1, "v": 10}]));
    assert_eq!(body["missing"], json!([9]));

    let (status, _) = send(
        &app,
        "PUT",
        "/api/data/bulk",
        Some(json!({"collection": "c", "documents": [{"_id": 2, "v": 20}, {"v": 0}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = send(&app, "GET", "/api/data?collection=c", None).await;
    assert_eq!(body[1]["v"], 2);
}

// Deletes

#[tokio::test]
async fn test_delete_many() {
    let app = create_test_app();
    for i in 1..=3 {
        insert(&app, "c", json!({"_id": i})).await;
    }
    let (status, body) = send(
        &app,
        "DELETE",
        "/api/data",
        Some(json!({"collection": "c", "ids": [1, 3, 5]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_count"], 2);

    let (_, body) = send(&app, "GET", "/api/data?collection=c", None).await;
    assert_eq!(body, json!([{"_id": 2}]));

    let (status, _) = send(&app, "DELETE", "/api/data", Some(json!({"collection": "c", "ids": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_one() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": 5})).await;
    let (status, body) = send(&app, "DELETE", "/api/data/5?collection=c", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_count"], 1);

    let (status, _) = send(&app, "DELETE", "/api/data/5?collection=c", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// Set field on all

#[tokio::test]
async fn test_set_field_on_all() {
    let app = create_test_app();
    insert(&app, "c", json!({"_id": 1})).await;
    insert(&app, "c", json!({"_id": 2})).await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/add-field-all",
        Some(json!({"collection": "c", "key": "status"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched_count"], 2);

    insert(&app, "c", json!({"_id": 3})).await;
    let (_, body) = send(&app, "GET", "/api/data?collection=c", None).await;
    assert_eq!(body[0]["status"], "");
    assert_eq!(body[1]["status"], "");
    assert!(body[2].get("status").is_none());

    let (status, _) = send(&app, "PUT", "/api/add-field-all", Some(json!({"collection": "c"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        "PUT",
        "/api/add-field-all",
        Some(json!({"collection": "c", "key": "_id", "value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_default_database_from_config() {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let config = Config {
        default_database: "panel".to_string(),
        ..Config::default()
    };
    let app = create_router(AppState::new(store.clone(), config));
    insert(&app, "c", json!({"a": 1})).await;
    assert_eq!(store.list_databases().unwrap(), vec!["panel"]);
}
