// docpanel-core/src/store/memory.rs
//! Pure in-memory store
//!
//! ```text
//! MemoryStore
//!      ↓
//! HashMap<database, HashMap<collection, Vec<Document>>>
//! ```
//!
//! Nothing is persisted; the data lives as long as the store. Used for
//! `memory://` deployments and throughout the test suites.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::ops;
use super::CollectionStore;
use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::update::Update;

type Collections = HashMap<String, Vec<Document>>;

/// In-memory store backend
#[derive(Default)]
pub struct MemoryStore {
    databases: RwLock<HashMap<String, Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against an existing collection; `None` if it was never created
    fn with_collection<T>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> Option<T> {
        let mut dbs = self.databases.write();
        let docs = dbs.get_mut(database)?.get_mut(collection)?;
        Some(f(docs))
    }
}

impl CollectionStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .databases
            .read()
            .get(database)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        ops::check_target(database, collection, false)?;
        let dbs = self.databases.read();
        Ok(dbs
            .get(database)
            .and_then(|colls| colls.get(collection))
            .cloned()
            .unwrap_or_default())
    }

    fn insert_one(
        &self,
        database: &str,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        ops::check_target(database, collection, true)?;
        let mut dbs = self.databases.write();
        // a rejected insert must not create the collection
        let existing = dbs
            .get(database)
            .and_then(|colls| colls.get(collection))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let doc = ops::prepare_insert(existing, fields)?;

        dbs.entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    fn update_by_id(
        &self,
        database: &str,
        collection: &str,
        id: &DocumentId,
        update: &Update,
    ) -> Result<Option<Document>> {
        ops::check_target(database, collection, true)?;
        Ok(self
            .with_collection(database, collection, |docs| ops::update_in(docs, id, update))
            .flatten())
    }

    fn delete_many(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64> {
        ops::check_target(database, collection, true)?;
        Ok(self
            .with_collection(database, collection, |docs| ops::delete_from(docs, ids))
            .unwrap_or(0))
    }

    fn set_field_all(
        &self,
        database: &str,
        collection: &str,
        field: &str,
        value: Value,
    ) -> Result<u64> {
        ops::check_target(database, collection, true)?;
        Ok(self
            .with_collection(database, collection, |docs| {
                ops::set_all_in(docs, field, &value)
            })
            .unwrap_or(0))
    }
}
