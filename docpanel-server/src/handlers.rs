//! Route handlers
//!
//! Each handler pulls names and payload out of the request, runs the matching
//! gateway operation on a blocking worker and returns JSON.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docpanel_core::gateway::{self, BulkOutcome, ListOptions};
use docpanel_core::{list_catalog, CatalogEntry, Document, DocumentId, PanelError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Run a store call off the async runtime
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> docpanel_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn require_collection(collection: Option<String>) -> ApiResult<String> {
    collection
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("collection is required"))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub collection: Option<String>,
    pub database: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub hide_id: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub collection: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub collection: Option<String>,
    pub database: Option<String>,
    #[serde(default)]
    pub document: Value,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub collection: Option<String>,
    pub database: Option<String>,
    pub documents: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub collection: Option<String>,
    pub database: Option<String>,
    #[serde(default)]
    pub ids: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub collection: Option<String>,
    pub database: Option<String>,
    pub key: Option<String>,
    pub value: Option<Value>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let store = state.store.clone();
    blocking(move || store.ping()).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": crate::VERSION,
            "store": state.store.kind(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    ))
}

/// GET /api/databases
pub async fn list_databases(State(state): State<AppState>) -> ApiResult<Json<Vec<CatalogEntry>>> {
    let store = state.store.clone();
    let catalog = blocking(move || list_catalog(store.as_ref())).await?;
    Ok(Json(catalog))
}

/// GET /api/data?collection=..
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let collection = require_collection(query.collection)?;
    let database = state.database(query.database);
    let options = ListOptions {
        skip: query.skip,
        limit: query.limit,
        hide_id: query.hide_id.unwrap_or(false),
    };
    let store = state.store.clone();
    let docs = blocking(move || {
        gateway::list_documents(store.as_ref(), &database, &collection, options)
    })
    .await?;
    Ok(Json(docs))
}

/// POST /api/data
pub async fn insert_document(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> ApiResult<Json<Document>> {
    let collection = require_collection(request.collection)?;
    let database = state.database(request.database);
    let store = state.store.clone();
    let doc = blocking(move || {
        gateway::insert_document(store.as_ref(), &database, &collection, request.document)
    })
    .await?;
    Ok(Json(doc))
}

/// PUT /api/data/:id?collection=..
pub async fn update_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TargetQuery>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Document>> {
    let collection = require_collection(query.collection)?;
    let database = state.database(query.database);
    let id = DocumentId::String(id);
    let store = state.store.clone();
    let doc = blocking(move || {
        gateway::update_document(store.as_ref(), &database, &collection, &id, &patch)
    })
    .await?;
    Ok(Json(doc))
}

/// PUT /api/data with the id inside the document
pub async fn update_in_body(
    State(state): State<AppState>,
    Json(request): Json<DocumentRequest>,
) -> ApiResult<Json<Document>> {
    let collection = require_collection(request.collection)?;
    let database = state.database(request.database);
    let (id, patch) = gateway::split_id(&request.document)?;
    let store = state.store.clone();
    let doc = blocking(move || {
        gateway::update_document(store.as_ref(), &database, &collection, &id, &patch)
    })
    .await?;
    Ok(Json(doc))
}

/// PUT /api/data/bulk
pub async fn bulk_update(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> ApiResult<Json<BulkOutcome>> {
    let collection = require_collection(request.collection)?;
    let database = state.database(request.database);
    let documents = request
        .documents
        .ok_or_else(|| ApiError::bad_request("documents is required"))?;
    let store = state.store.clone();
    let outcome = blocking(move || {
        gateway::bulk_update(store.as_ref(), &database, &collection, &documents)
    })
    .await?;
    Ok(Json(outcome))
}

/// DELETE /api/data/:id?collection=..
pub async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TargetQuery>,
) -> ApiResult<Json<Value>> {
    let collection = require_collection(query.collection)?;
    let database = state.database(query.database);
    let ids = vec![DocumentId::String(id.clone())];
    let store = state.store.clone();
    let deleted = blocking(move || {
        gateway::delete_documents(store.as_ref(), &database, &collection, &ids)
    })
    .await?;
    if deleted == 0 {
        return Err(PanelError::NotFound(format!("no document with _id '{}'", id)).into());
    }
    Ok(Json(json!({"message": "document deleted", "deleted_count": deleted})))
}

/// DELETE /api/data
pub async fn delete_many(
    State(state): State<AppState>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    let collection = require_collection(request.collection)?;
    let database = state.database(request.database);
    let ids = request
        .ids
        .iter()
        .map(|raw| {
            DocumentId::from_value(raw)
                .ok_or_else(|| ApiError::bad_request(format!("invalid id {}", raw)))
        })
        .collect::<ApiResult<Vec<_>>>()?;
    let store = state.store.clone();
    let deleted = blocking(move || {
        gateway::delete_documents(store.as_ref(), &database, &collection, &ids)
    })
    .await?;
    Ok(Json(json!({"message": "documents deleted", "deleted_count": deleted})))
}

/// PUT /api/add-field-all
pub async fn set_field_all(
    State(state): State<AppState>,
    Json(request): Json<SetFieldRequest>,
) -> ApiResult<Json<Value>> {
    let collection = require_collection(request.collection)?;
    let database = state.database(request.database);
    let key = request
        .key
        .ok_or_else(|| ApiError::bad_request("key is required"))?;
    let store = state.store.clone();
    let matched = blocking(move || {
        gateway::set_field_on_all(store.as_ref(), &database, &collection, &key, request.value)
    })
    .await?;
    Ok(Json(json!({"message": "field set on all documents", "matched_count": matched})))
}
