// docpanel-core/src/store/file.rs
//! Directory-backed store
//!
//! ```text
//! <root>/
//!   <database>/
//!     <collection>.json    JSON array of documents
//! ```
//!
//! Reads always go to disk. Writes load the collection file, mutate it and
//! replace it atomically (write `<collection>.json.tmp`, then rename) while
//! holding the store's write lock.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::ops;
use super::CollectionStore;
use crate::document::{Document, DocumentId};
use crate::error::{PanelError, Result};
use crate::names;
use crate::update::Update;

const COLLECTION_EXT: &str = "json";

/// File-based store backend
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            PanelError::Connection(format!("cannot open store at {}: {}", root.display(), e))
        })?;
        Ok(FileStore {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn check_root(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(PanelError::Connection(format!(
                "store directory {} is not available",
                self.root.display()
            )))
        }
    }

    fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root
            .join(database)
            .join(format!("{}.{}", collection, COLLECTION_EXT))
    }

    fn load(&self, database: &str, collection: &str) -> Result<Option<Vec<Document>>> {
        let path = self.collection_path(database, collection);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let docs: Vec<Document> = serde_json::from_slice(&bytes).map_err(|e| {
            PanelError::Store(format!("corrupt collection file {}: {}", path.display(), e))
        })?;
        Ok(Some(docs))
    }

    fn save(&self, database: &str, collection: &str, docs: &[Document]) -> Result<()> {
        let path = self.collection_path(database, collection);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension(format!("{}.tmp", COLLECTION_EXT));
        fs::write(&tmp, serde_json::to_vec_pretty(docs)?)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(
            database,
            collection,
            documents = docs.len(),
            "collection file written"
        );
        Ok(())
    }

    /// Load-mutate-save an existing collection; `None` if it has no file yet
    fn modify<T>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> Result<Option<T>> {
        self.check_root()?;
        let _guard = self.write_lock.lock();
        let Some(mut docs) = self.load(database, collection)? else {
            return Ok(None);
        };
        let out = f(&mut docs);
        self.save(database, collection, &docs)?;
        Ok(Some(out))
    }

    /// Directory entries under `dir` whose names pass `keep`
    fn entry_names(dir: &Path, keep: impl Fn(&Path) -> Option<String>) -> Result<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            if let Some(name) = keep(&entry?.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl CollectionStore for FileStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn ping(&self) -> Result<()> {
        self.check_root()
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        self.check_root()?;
        Self::entry_names(&self.root, |path| {
            let name = path.file_name()?.to_str()?;
            (path.is_dir() && names::validate_database_name(name).is_ok())
                .then(|| name.to_string())
        })
    }

    fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        self.check_root()?;
        names::validate_database_name(database)?;
        Self::entry_names(&self.root.join(database), |path| {
            if path.extension()?.to_str()? != COLLECTION_EXT || !path.is_file() {
                return None;
            }
            let stem = path.file_stem()?.to_str()?;
            names::validate_collection_name(stem)
                .is_ok()
                .then(|| stem.to_string())
        })
    }

    fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>> {
        ops::check_target(database, collection, false)?;
        self.check_root()?;
        Ok(self.load(database, collection)?.unwrap_or_default())
    }

    fn insert_one(
        &self,
        database: &str,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Document> {
        ops::check_target(database, collection, true)?;
        self.check_root()?;
        let _guard = self.write_lock.lock();
        let mut docs = self.load(database, collection)?.unwrap_or_default();
        let doc = ops::prepare_insert(&docs, fields)?;
        docs.push(doc.clone());
        self.save(database, collection, &docs)?;
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
            .modify(database, collection, |docs| ops::update_in(docs, id, update))?
            .flatten())
    }

    fn delete_many(&self, database: &str, collection: &str, ids: &[DocumentId]) -> Result<u64> {
        ops::check_target(database, collection, true)?;
        Ok(self
            .modify(database, collection, |docs| ops::delete_from(docs, ids))?
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
            .modify(database, collection, |docs| {
                ops::set_all_in(docs, field, &value)
            })?
            .unwrap_or(0))
    }
}
