// docpanel-core/src/lib.rs
// Storage, gateway operations and browser state; no HTTP dependencies

pub mod browser;
pub mod catalog;
pub mod document;
pub mod error;
pub mod gateway;
pub mod names;
pub mod store;
pub mod update;

// Public exports
pub use catalog::{list_catalog, CatalogEntry};
pub use document::{Document, DocumentId, ID_FIELD};
pub use error::{PanelError, Result};
pub use gateway::{BulkOutcome, Gateway, ListOptions, LocalGateway};
pub use store::{open_store, CollectionStore, FileStore, MemoryStore, StoreUri};
pub use update::Update;
