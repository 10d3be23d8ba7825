// docpanel-core/src/store/mod.rs
//! Collection store abstraction
//!
//! The gateway addresses documents by `(database, collection)` name pairs
//! chosen by the caller, with no fixed schema. `CollectionStore` is the
//! capability every backend provides for that:
//!
//! ```text
//! CollectionStore (object-safe, shared as Arc<dyn CollectionStore>)
//!   ├── MemoryStore (memory://, process-local)
//!   └── FileStore   (file://<dir>, one JSON file per collection)
//! ```
//!
//! Every operation is committed on its own. Backends lock only to keep a
//! single operation consistent; nothing spans two calls.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::document::{Document, DocumentId};
use crate::error::{PanelError, Result};
use crate::update::Update;

mod file;
mod memory;
pub(crate) mod ops;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Document store keyed by caller-supplied database and collection names
pub trait CollectionStore: Send + Sync {
    /// Short backend label, reported as the catalog `type`
    fn kind(&self) -> &'static str;

    /// Fail with `Connection` when the backend cannot serve requests
    fn ping(&self) -> Result<()>;

    /// Every database name, system databases included
    fn list_databases(&self) -> Result<Vec<String>>;

    /// Collection names of one database, sorted
    fn list_collections(&self, database: &str) -> Result<Vec<String>>;

    /// All documents of a collection in insertion order.
    /// A collection that was never written reads as empty.
    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>>;

    /// Store a new document, creating the collection on first write.
    /// Returns the stored document including its `_id`.
    fn insert_one(
        &self,
        database: &str,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Document>;

    /// Apply `update` to the document with `id`; `Ok(None)` when absent
    fn update_by_id(
        &self,
        database: &str,
        collection: &str,
        id: &DocumentId,
        update: &Update,
    ) -> Result<Option<Document>>;

    /// Remove every document whose id is listed; returns the number removed
    fn delete_many(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64>;

    /// Set `field` to `value` on every document currently in the collection
    fn set_field_all(
        &self,
        database: &str,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<u64>;
}

/// Parsed store connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    Memory,
    File(PathBuf),
}

impl StoreUri {
    /// `memory://`, `file://<path>` or a bare filesystem path
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(PanelError::Connection("empty store connection string".into()));
        }
        if uri == "memory" || uri.starts_with("memory:") {
            return Ok(StoreUri::Memory);
        }
        if let Some(path) = uri.strip_prefix("file://") {
            if path.is_empty() {
                return Err(PanelError::Connection("file:// needs a directory path".into()));
            }
            return Ok(StoreUri::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = uri.split_once("://") {
            return Err(PanelError::Connection(format!(
                "unsupported store scheme '{}'",
                scheme
            )));
        }
        Ok(StoreUri::File(PathBuf::from(uri)))
    }
}

/// Open the store a connection string points at
pub fn open_store(uri: &str) -> Result<Arc<dyn CollectionStore>> {
    let store: Arc<dyn CollectionStore> = match StoreUri::parse(uri)? {
        StoreUri::Memory => Arc::new(MemoryStore::new()),
        StoreUri::File(path) => Arc::new(FileStore::open(path)?),
    };
    tracing::debug!(uri, kind = store.kind(), "store opened");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_uri() {
        assert_eq!(StoreUri::parse("memory://").unwrap(), StoreUri::Memory);
        assert_eq!(StoreUri::parse("memory").unwrap(), StoreUri::Memory);
        assert_eq!(
            StoreUri::parse("file:///var/lib/docpanel").unwrap(),
            StoreUri::File(PathBuf::from("/var/lib/docpanel"))
        );
        assert_eq!(
            StoreUri::parse("./data").unwrap(),
            StoreUri::File(PathBuf::from("./data"))
        );
    }

    #[test]
    fn test_parse_store_uri_errors() {
        for uri in ["", "   ", "file://", "mongodb://localhost:27017"] {
            assert!(
                matches!(StoreUri::parse(uri), Err(PanelError::Connection(_))),
                "{:?}",
                uri
            );
        }
    }

    #[test]
    fn test_open_store_memory() {
        let store = open_store("memory://").unwrap();
        assert_eq!(store.kind(), "memory");
        assert!(store.ping().is_ok());
    }
}
