//! Partial-document updates
//!
//! A patch without `$`-prefixed keys is a plain field merge (every key is
//! set, dotted keys reach into nested objects). A patch whose keys are
//! operators is applied operator by operator: `$set`, `$unset`, `$inc`,
//! `$rename`. The identity field is never touched by either form.

use serde_json::{Map, Value};

use crate::document::{Document, ID_FIELD};
use crate::error::{PanelError, Result};

/// Parsed update, ready to be applied to any number of documents
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Merge(Map<String, Value>),
    Operators(Vec<(Operator, Map<String, Value>)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Set,
    Unset,
    Inc,
    Rename,
}

impl Operator {
    fn parse(op: &str) -> Result<Self> {
        match op {
            "$set" => Ok(Operator::Set),
            "$unset" => Ok(Operator::Unset),
            "$inc" => Ok(Operator::Inc),
            "$rename" => Ok(Operator::Rename),
            other => Err(PanelError::validation(format!(
                "unsupported update operator '{}'",
                other
            ))),
        }
    }
}

fn is_id_path(field: &str) -> bool {
    field == ID_FIELD || field.starts_with("_id.")
}

impl Update {
    /// Parse a request body into an update
    pub fn parse(patch: &Value) -> Result<Self> {
        let obj = patch
            .as_object()
            .ok_or_else(|| PanelError::validation("update must be a JSON object"))?;

        let mut fields = obj.clone();
        fields.shift_remove(ID_FIELD);

        let has_operators = fields.keys().any(|k| k.starts_with('$'));
        if !has_operators {
            return Ok(Update::Merge(fields));
        }

        let mut ops = Vec::with_capacity(fields.len());
        for (key, args) in &fields {
            if !key.starts_with('$') {
                return Err(PanelError::validation(format!(
                    "cannot mix operators with plain field '{}'",
                    key
                )));
            }
            let op = Operator::parse(key)?;
            let args = args.as_object().ok_or_else(|| {
                PanelError::validation(format!("{} expects an object argument", key))
            })?;
            if op == Operator::Inc {
                if let Some((field, _)) = args.iter().find(|(_, v)| !v.is_number()) {
                    return Err(PanelError::validation(format!(
                        "$inc value for '{}' must be a number",
                        field
                    )));
                }
            }
            if op == Operator::Rename {
                if let Some((field, _)) = args.iter().find(|(_, v)| !v.is_string()) {
                    return Err(PanelError::validation(format!(
                        "$rename target for '{}' must be a string",
                        field
                    )));
                }
            }
            ops.push((op, args.clone()));
        }
        Ok(Update::Operators(ops))
    }

    /// `$set` of a single field, as used by "set field on all documents"
    pub fn set_field(field: &str, value: Value) -> Self {
        let mut args = Map::new();
        args.insert(field.to_string(), value);
        Update::Operators(vec![(Operator::Set, args)])
    }

    /// Apply to a document. Returns true when anything changed.
    pub fn apply(&self, doc: &mut Document) -> bool {
        let before = doc.fields.clone();
        match self {
            Update::Merge(fields) => {
                for (field, value) in fields.iter().filter(|(f, _)| !is_id_path(f)) {
                    doc.set_nested(field, value.clone());
                }
            }
            Update::Operators(ops) => {
                for (op, args) in ops {
                    apply_operator(doc, *op, args);
                }
            }
        }
        doc.fields != before
    }
}

fn apply_operator(doc: &mut Document, op: Operator, args: &Map<String, Value>) {
    for (field, value) in args {
        if is_id_path(field) {
            continue;
        }
        match op {
            Operator::Set => doc.set_nested(field, value.clone()),
            Operator::Unset => {
                doc.remove_nested(field);
            }
            Operator::Inc => {
                let next = match doc.get(field) {
                    None => value.clone(),
                    Some(current) => match add_numbers(current, value) {
                        Some(sum) => sum,
                        None => continue,
                    },
                };
                doc.set_nested(field, next);
            }
            Operator::Rename => {
                let Some(target) = value.as_str() else {
                    continue;
                };
                if is_id_path(target) {
                    continue;
                }
                if let Some(moved) = doc.remove_nested(field) {
                    doc.set_nested(target, moved);
                }
            }
        }
    }
}

/// Integer addition when both sides are integers, float otherwise
fn add_numbers(current: &Value, inc: &Value) -> Option<Value> {
    if let (Some(a), Some(b)) = (current.as_i64(), inc.as_i64()) {
        return Some(Value::from(a.checked_add(b)?));
    }
    let (a, b) = (current.as_f64()?, inc.as_f64()?);
    Some(Value::from(a + b))
}
