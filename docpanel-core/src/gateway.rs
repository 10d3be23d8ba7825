// docpanel-core/src/gateway.rs
//! Gateway operations
//!
//! Request-level semantics of the admin panel, expressed over any
//! `CollectionStore`. The HTTP server maps routes onto these functions and
//! `LocalGateway` exposes them in-process through the `Gateway` trait, so a
//! browser session behaves the same against either.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{list_catalog, CatalogEntry};
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{PanelError, Result};
use crate::names;
use crate::store::CollectionStore;
use crate::update::Update;

/// Listing options for `list_documents`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub hide_id: bool,
}

/// Result of a bulk update: documents that were found and updated, and the
/// ids that matched nothing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub updated: Vec<Document>,
    pub missing: Vec<DocumentId>,
}

pub fn list_documents(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    options: ListOptions,
) -> Result<Vec<Value>> {
    names::validate_collection_name(collection)?;
    let docs = store.find_all(database, collection)?;
    let skip = options.skip.unwrap_or(0);
    let limit = options.limit.unwrap_or(usize::MAX);
    Ok(docs
        .iter()
        .skip(skip)
        .take(limit)
        .map(|d| {
            if options.hide_id {
                d.to_value_without_id()
            } else {
                d.to_value()
            }
        })
        .collect())
}

pub fn insert_document(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    document: Value,
) -> Result<Document> {
    names::validate_collection_name(collection)?;
    let fields = match document {
        Value::Object(map) => map,
        Value::Null => return Err(PanelError::validation("document is required")),
        _ => return Err(PanelError::validation("document must be a JSON object")),
    };
    let doc = store.insert_one(database, collection, fields)?;
    tracing::info!(database, collection, id = %doc.id, "document inserted");
    Ok(doc)
}

/// Update one document. A missing id is `NotFound`.
pub fn update_document(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    id: &DocumentId,
    patch: &Value,
) -> Result<Document> {
    names::validate_collection_name(collection)?;
    let update = Update::parse(patch)?;
    tracing::info!(database, collection, %id, "updating document");
    store
        .update_by_id(database, collection, id, &update)?
        .ok_or_else(|| PanelError::NotFound(format!("no document with _id '{}'", id)))
}

/// Split `{_id, ...fields}` into its id and the remaining patch
pub fn split_id(document: &Value) -> Result<(DocumentId, Value)> {
    let obj = document
        .as_object()
        .ok_or_else(|| PanelError::validation("document must be a JSON object"))?;
    let id = obj
        .get(ID_FIELD)
        .and_then(DocumentId::from_value)
        .ok_or_else(|| PanelError::validation("document must carry a string or integer _id"))?;
    let mut patch = obj.clone();
    patch.shift_remove(ID_FIELD);
    Ok((id, Value::Object(patch)))
}

/// Apply a batch of partial documents, each carrying its own `_id`.
///
/// The whole batch is parsed first; any malformed entry rejects the batch
/// before anything is written. Entries are then applied one by one: ids that
/// match nothing are reported in `missing`, and a store failure stops the
/// batch with earlier entries left applied.
pub fn bulk_update(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    documents: &[Value],
) -> Result<BulkOutcome> {
    names::validate_collection_name(collection)?;

    let mut batch = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let (id, patch) = split_id(document)
            .map_err(|e| PanelError::validation(format!("documents[{}]: {}", index, e)))?;
        let update = Update::parse(&patch)
            .map_err(|e| PanelError::validation(format!("documents[{}]: {}", index, e)))?;
        batch.push((id, update));
    }

    let mut outcome = BulkOutcome::default();
    for (id, update) in &batch {
        match store.update_by_id(database, collection, id, update)? {
            Some(doc) => outcome.updated.push(doc),
            None => outcome.missing.push(id.clone()),
        }
    }
    tracing::info!(
        database,
        collection,
        updated = outcome.updated.len(),
        missing = outcome.missing.len(),
        "bulk update applied"
    );
    Ok(outcome)
}

pub fn delete_documents(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    ids: &[DocumentId],
) -> Result<u64> {
    names::validate_collection_name(collection)?;
    if ids.is_empty() {
        return Err(PanelError::validation("ids must not be empty"));
    }
    let deleted = store.delete_many(database, collection, ids)?;
    tracing::info!(database, collection, requested = ids.len(), deleted, "documents deleted");
    Ok(deleted)
}

/// Set `key` on every document of the collection. A missing or null value
/// stores the empty string.
pub fn set_field_on_all(
    store: &dyn CollectionStore,
    database: &str,
    collection: &str,
    key: &str,
    value: Option<Value>,
) -> Result<u64> {
    names::validate_collection_name(collection)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PanelError::validation("key is required"));
    }
    if key == ID_FIELD || key.starts_with("_id.") {
        return Err(PanelError::validation("the _id field cannot be overwritten"));
    }
    let value = match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(v) => v,
    };
    tracing::info!(database, collection, key, value = %value, "setting field on all documents");
    store.set_field_all(database, collection, key, value)
}

/// What a browser needs from the backend, whether over HTTP or in-process
pub trait Gateway {
    fn databases(&self) -> Result<Vec<CatalogEntry>>;

    fn documents(&self, database: &str, collection: &str) -> Result<Vec<Document>>;

    fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<Document>;

    fn update(
        &self,
        database: &str,
        collection: &str,
        id: &DocumentId,
        patch: Value,
    ) -> Result<Document>;

    fn bulk_update(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<BulkOutcome>;

    fn delete(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64>;

    fn set_field_all(
        &self,
        database: &str,
        collection: &str,
        key: &str,
        value: Option<Value>,
    ) -> Result<u64>;
}

/// In-process gateway over a store handle
#[derive(Clone)]
pub struct LocalGateway {
    store: Arc<dyn CollectionStore>,
}

impl LocalGateway {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        LocalGateway { store }
    }

    pub fn store(&self) -> &Arc<dyn CollectionStore> {
        &self.store
    }
}

impl Gateway for LocalGateway {
    fn databases(&self) -> Result<Vec<CatalogEntry>> {
        list_catalog(self.store.as_ref())
    }

    fn documents(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        names::validate_collection_name(collection)?;
        self.store.find_all(database, collection)
    }

    fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<Document> {
        insert_document(self.store.as_ref(), database, collection, Value::Object(document))
    }

    fn update(
        &self,
        database: &str,
        collection: &str,
        id: &DocumentId,
        patch: Value,
    ) -> Result<Document> {
        update_document(self.store.as_ref(), database, collection, id, &patch)
    }

    fn bulk_update(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<BulkOutcome> {
        bulk_update(self.store.as_ref(), database, collection, &documents)
    }

    fn delete(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64> {
        delete_documents(self.store.as_ref(), database, collection, ids)
    }

    fn set_field_all(
        &self,
        database: &str,
        collection: &str,
        key: &str,
        value: Option<Value>,
    ) -> Result<u64> {
        set_field_on_all(self.store.as_ref(), database, collection, key, value)
    }
}
