//! Gateway client over HTTP

use std::time::Duration;

use docpanel_core::gateway::{BulkOutcome, Gateway, ListOptions};
use docpanel_core::{CatalogEntry, Document, DocumentId, PanelError, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Error body sent by the gateway
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct DeletedCount {
    deleted_count: u64,
}

#[derive(Debug, Deserialize)]
struct MatchedCount {
    matched_count: u64,
}

/// Query pairs naming the target collection. An empty `database` is left
/// out so the gateway applies its configured default.
fn target_query(database: &str, collection: &str) -> Vec<(&'static str, String)> {
    let mut query = vec![("collection", collection.to_string())];
    if !database.is_empty() {
        query.push(("database", database.to_string()));
    }
    query
}

/// Request body naming the target collection, same rule as `target_query`
fn target_body(database: &str, collection: &str) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("collection".to_string(), Value::from(collection));
    if !database.is_empty() {
        body.insert("database".to_string(), Value::from(database));
    }
    body
}

pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| PanelError::validation(format!("invalid server URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PanelError::Connection(format!("failed to build HTTP client: {}", e)))?;
        Ok(HttpGateway { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` joined with `segments`, each percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PanelError::validation(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .map_err(|e| PanelError::Connection(format!("gateway unreachable: {}", e)))?;
        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "gateway response");
        if status.is_success() {
            return response
                .json()
                .map_err(|e| PanelError::Store(format!("unexpected gateway response: {}", e)));
        }
        match response.json::<ErrorBody>() {
            Ok(body) => Err(PanelError::from_code(&body.code, body.error)),
            Err(_) => Err(PanelError::Store(format!("gateway returned {}", status))),
        }
    }

    pub fn health(&self) -> Result<Value> {
        self.call(self.client.get(self.url(&["health"])?))
    }

    /// Raw listing with paging options, as served by `GET /api/data`
    pub fn list(&self, database: &str, collection: &str, options: ListOptions) -> Result<Vec<Value>> {
        let mut query = target_query(database, collection);
        if let Some(skip) = options.skip {
            query.push(("skip", skip.to_string()));
        }
        if let Some(limit) = options.limit {
            query.push(("limit", limit.to_string()));
        }
        if options.hide_id {
            query.push(("hide_id", "true".to_string()));
        }
        self.call(self.client.get(self.url(&["api", "data"])?).query(&query))
    }
}

impl Gateway for HttpGateway {
    fn databases(&self) -> Result<Vec<CatalogEntry>> {
        self.call(self.client.get(self.url(&["api", "databases"])?))
    }

    fn documents(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        self.list(database, collection, ListOptions::default())?
            .into_iter()
            .map(Document::from_value)
            .collect()
    }

    fn insert(
        &self,
        database: &str,
        collection: &str,
        document: Map<String, Value>,
    ) -> Result<Document> {
        let mut body = target_body(database, collection);
        body.insert("document".to_string(), Value::Object(document));
        self.call(self.client.post(self.url(&["api", "data"])?).json(&body))
    }

    fn update(
        &self,
        database: &str,
        collection: &str,
        id: &DocumentId,
        patch: Value,
    ) -> Result<Document> {
        let id = id.to_string();
        let request = self
            .client
            .put(self.url(&["api", "data", &id])?)
            .query(&target_query(database, collection))
            .json(&patch);
        self.call(request)
    }

    fn bulk_update(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<BulkOutcome> {
        let mut body = target_body(database, collection);
        body.insert("documents".to_string(), Value::Array(documents));
        self.call(self.client.put(self.url(&["api", "data", "bulk"])?).json(&body))
    }

    fn delete(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64> {
        let mut body = target_body(database, collection);
        body.insert("ids".to_string(), json!(ids));
        let counted: DeletedCount =
            self.call(self.client.delete(self.url(&["api", "data"])?).json(&body))?;
        Ok(counted.deleted_count)
    }

    fn set_field_all(
        &self,
        database: &str,
        collection: &str,
        key: &str,
        value: Option<Value>,
    ) -> Result<u64> {
        let mut body = target_body(database, collection);
        body.insert("key".to_string(), Value::from(key));
        body.insert("value".to_string(), value.unwrap_or(Value::Null));
        let counted: MatchedCount =
            self.call(self.client.put(self.url(&["api", "add-field-all"])?).json(&body))?;
        Ok(counted.matched_count)
    }
}
