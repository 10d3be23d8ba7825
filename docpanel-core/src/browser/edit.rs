//! Pending cell edits and user-typed values

use serde_json::{Map, Value};

use crate::document::{DocumentId, ID_FIELD};
use crate::error::{PanelError, Result};

/// Interpret text typed into a cell or form field.
///
/// Valid JSON (numbers, booleans, null, quoted strings, objects, arrays) is
/// taken as JSON; anything else is kept as a plain string.
pub fn parse_input(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::String(text.to_string());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Edits staged per document until an explicit save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditBuffer {
    pending: Vec<(DocumentId, Map<String, Value>)>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `field = value` for the document `id`. Later edits of the same
    /// field replace earlier ones.
    pub fn stage(&mut self, id: &DocumentId, field: &str, value: Value) -> Result<()> {
        if field.is_empty() {
            return Err(PanelError::validation("field name is required"));
        }
        if field == ID_FIELD {
            return Err(PanelError::validation("the _id field is read-only"));
        }
        match self.pending.iter_mut().find(|(pid, _)| pid == id) {
            Some((_, fields)) => {
                fields.insert(field.to_string(), value);
            }
            None => {
                let mut fields = Map::new();
                fields.insert(field.to_string(), value);
                self.pending.push((id.clone(), fields));
            }
        }
        Ok(())
    }

    pub fn pending_for(&self, id: &DocumentId) -> Option<&Map<String, Value>> {
        self.pending
            .iter()
            .find(|(pid, _)| pid == id)
            .map(|(_, fields)| fields)
    }

    /// Number of documents with staged edits
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Bulk-update payloads (`{_id, ...changed fields}`) in staging order
    pub fn payloads(&self) -> Vec<Value> {
        self.pending
            .iter()
            .map(|(id, fields)| {
                let mut doc = Map::with_capacity(fields.len() + 1);
                doc.insert(ID_FIELD.to_string(), id.to_value());
                doc.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::Object(doc)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
