// docpanel-core/src/document.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{PanelError, Result};

/// Name of the store-assigned identity field
pub const ID_FIELD: &str = "_id";

/// Schema-less document: an ordered field map plus its identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocumentId,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Document identity.
/// Untagged so it appears as a plain value in documents: {"_id": 2}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    String(String),
}

impl DocumentId {
    /// Fresh store-assigned id (UUID v4, simple form)
    pub fn generate() -> Self {
        DocumentId::String(Uuid::new_v4().simple().to_string())
    }

    /// Interpret a JSON value as an id. Only integers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(DocumentId::String(s.clone())),
            Value::Number(n) => n.as_i64().map(DocumentId::Int),
            _ => None,
        }
    }

    /// Loose identity: `Int(42)` and `String("42")` address the same document
    pub fn same_as(&self, other: &DocumentId) -> bool {
        self == other || self.to_string() == other.to_string()
    }

    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Int(i) => Value::from(*i),
            DocumentId::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(i) => write!(f, "{}", i),
            DocumentId::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::String(s.to_string())
    }
}

impl From<i64> for DocumentId {
    fn from(i: i64) -> Self {
        DocumentId::Int(i)
    }
}

impl Document {
    pub fn new(id: DocumentId, fields: Map<String, Value>) -> Self {
        let mut fields = fields;
        fields.shift_remove(ID_FIELD);
        Document { id, fields }
    }

    /// Build a stored document from a JSON object that carries `_id`
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut map) => {
                let id = map
                    .shift_remove(ID_FIELD)
                    .as_ref()
                    .and_then(DocumentId::from_value)
                    .ok_or_else(|| PanelError::validation("document has no usable _id"))?;
                Ok(Document { id, fields: map })
            }
            _ => Err(PanelError::validation("document must be a JSON object")),
        }
    }

    /// JSON object with `_id` first, then fields in stored order
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert(ID_FIELD.to_string(), self.id.to_value());
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    /// Same as `to_value` but without the identity field
    pub fn to_value_without_id(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Field lookup with dot-path support ("address.city", "tags.0").
    /// `_id` resolves to nothing here; use `self.id`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        if field.is_empty() {
            return None;
        }
        let mut parts = field.split('.');
        let mut value = self.fields.get(parts.next()?)?;
        for part in parts {
            value = match value {
                Value::Object(map) => map.get(part)?,
                Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Top-level set
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Set with dot-path support, creating intermediate objects as needed
    pub fn set_nested(&mut self, field: &str, value: Value) {
        let parts: Vec<&str> = field.split('.').collect();
        if parts.len() == 1 {
            self.fields.insert(field.to_string(), value);
            return;
        }

        match self.fields.get_mut(parts[0]) {
            Some(root) => set_value_at_path(root, &parts[1..], value),
            None => {
                let nested = create_nested_value(&parts[1..], value);
                self.fields.insert(parts[0].to_string(), nested);
            }
        }
    }

    /// Remove with dot-path support
    pub fn remove_nested(&mut self, field: &str) -> Option<Value> {
        let parts: Vec<&str> = field.split('.').collect();
        if parts.len() == 1 {
            return self.fields.shift_remove(field);
        }
        let root = self.fields.get_mut(parts[0])?;
        remove_value_at_path(root, &parts[1..])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.to_value()
    }
}

fn create_nested_value(parts: &[&str], value: Value) -> Value {
    match parts.split_first() {
        None => value,
        Some((head, rest)) => {
            let mut obj = Map::new();
            obj.insert(head.to_string(), create_nested_value(rest, value));
            Value::Object(obj)
        }
    }
}

fn set_value_at_path(current: &mut Value, parts: &[&str], value: Value) {
    let Some((head, rest)) = parts.split_first() else {
        return;
    };

    match current {
        Value::Object(map) => {
            if rest.is_empty() {
                map.insert(head.to_string(), value);
            } else if let Some(next) = map.get_mut(*head) {
                set_value_at_path(next, rest, value);
            } else {
                map.insert(head.to_string(), create_nested_value(rest, value));
            }
        }
        Value::Array(arr) => {
            if let Some(slot) = head.parse::<usize>().ok().and_then(|i| arr.get_mut(i)) {
                if rest.is_empty() {
                    *slot = value;
                } else {
                    set_value_at_path(slot, rest, value);
                }
            }
        }
        // Scalars on the path are replaced by an object
        _ => *current = create_nested_value(parts, value),
    }
}

fn remove_value_at_path(current: &mut Value, parts: &[&str]) -> Option<Value> {
    let (head, rest) = parts.split_first()?;
    match current {
        Value::Object(map) if rest.is_empty() => map.shift_remove(*head),
        Value::Object(map) => remove_value_at_path(map.get_mut(*head)?, rest),
        Value::Array(arr) => {
            let index = head.parse::<usize>().ok()?;
            if index >= arr.len() {
                return None;
            }
            if rest.is_empty() {
                Some(arr.remove(index))
            } else {
                remove_value_at_path(&mut arr[index], rest)
            }
        }
        _ => None,
    }
}
