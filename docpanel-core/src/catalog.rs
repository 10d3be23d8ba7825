//! Catalog: the databases a store exposes and their collections

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::names::is_system_database;
use crate::store::CollectionStore;

/// One database as reported by `GET /api/databases`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub collections: Vec<String>,
}

/// Enumerate non-system databases and their collections.
/// Recomputed on every call.
pub fn list_catalog(store: &dyn CollectionStore) -> Result<Vec<CatalogEntry>> {
    let mut entries = Vec::new();
    for name in store.list_databases()? {
        if is_system_database(&name) {
            continue;
        }
        let collections = store.list_collections(&name)?;
        entries.push(CatalogEntry {
            name,
            kind: store.kind().to_string(),
            collections,
        });
    }
    Ok(entries)
}
