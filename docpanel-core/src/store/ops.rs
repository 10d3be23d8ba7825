// docpanel-core/src/store/ops.rs
//! Collection-level operations shared by every backend.
//!
//! Backends own loading and persisting a collection as a `Vec<Document>`;
//! the mutations themselves live here so both backends behave identically.

use serde_json::{Map, Value};

use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{PanelError, Result};
use crate::names;
use crate::update::Update;

/// Validate a (database, collection) pair before touching a backend
pub(crate) fn check_target(database: &str, collection: &str, write: bool) -> Result<()> {
    if write {
        names::validate_writable_database(database)?;
    } else {
        names::validate_database_name(database)?;
    }
    names::validate_collection_name(collection)
}

/// Build the stored document for an insert: keep a caller `_id` if usable,
/// otherwise assign a fresh one.
pub(crate) fn prepare_insert(docs: &[Document], mut fields: Map<String, Value>) -> Result<Document> {
    let id = match fields.shift_remove(ID_FIELD) {
        None | Some(Value::Null) => DocumentId::generate(),
        Some(raw) => DocumentId::from_value(&raw)
            .ok_or_else(|| PanelError::validation("_id must be a string or an integer"))?,
    };

    if docs.iter().any(|d| d.id.same_as(&id)) {
        return Err(PanelError::validation(format!("duplicate _id '{}'", id)));
    }
    Ok(Document::new(id, fields))
}

/// Apply `update` to the document with `id`. `None` when no document matches.
pub(crate) fn update_in(docs: &mut [Document], id: &DocumentId, update: &Update) -> Option<Document> {
    let doc = docs.iter_mut().find(|d| d.id.same_as(id))?;
    update.apply(doc);
    Some(doc.clone())
}

/// Remove every document whose id is in `ids`; returns how many went
pub(crate) fn delete_from(docs: &mut Vec<Document>, ids: &[DocumentId]) -> u64 {
    let before = docs.len();
    docs.retain(|d| !ids.iter().any(|id| d.id.same_as(id)));
    (before - docs.len()) as u64
}

/// Set `field` on every document; returns the number of documents visited
pub(crate) fn set_all_in(docs: &mut [Document], field: &str, value: &Value) -> u64 {
    let update = Update::set_field(field, value.clone());
    for doc in docs.iter_mut() {
        update.apply(doc);
    }
    docs.len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_prepare_insert_generates_id() {
        let doc = prepare_insert(&[], fields(json!({"name": "x"}))).unwrap();
        assert!(matches!(doc.id, DocumentId::String(ref s) if s.len() == 32));
        assert_eq!(doc.get("name"), Some(&json!("x")));
    }

    #[test]
    fn test_prepare_insert_keeps_caller_id_and_rejects_duplicates() {
        let first = prepare_insert(&[], fields(json!({"_id": 5}))).unwrap();
        assert_eq!(first.id, DocumentId::Int(5));

        let existing = vec![first];
        let dup = prepare_insert(&existing, fields(json!({"_id": "5"})));
        assert!(matches!(dup, Err(PanelError::Validation(_))));

        let bad = prepare_insert(&[], fields(json!({"_id": {"x": 1}})));
        assert!(matches!(bad, Err(PanelError::Validation(_))));
    }

    #[test]
    fn test_delete_from_removes_only_listed() {
        let mut docs: Vec<Document> = (1..=4)
            .map(|i| Document::from_value(json!({"_id": i})).unwrap())
            .collect();
        let removed = delete_from(&mut docs, &[DocumentId::Int(2), DocumentId::from("4")]);
        assert_eq!(removed, 2);
        let left: Vec<_> = docs.iter().map(|d| d.id.clone()).collect();
        assert_eq!(left, vec![DocumentId::Int(1), DocumentId::Int(3)]);
    }

    #[test]
    fn test_check_target() {
        assert!(check_target("test", "items", true).is_ok());
        assert!(check_target("admin", "items", false).is_ok());
        assert!(check_target("admin", "items", true).is_err());
        assert!(check_target("test", "../x", false).is_err());
    }
}
