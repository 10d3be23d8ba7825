//! Table columns and cell rendering

use serde_json::Value;

use super::search::stringify;
use crate::document::{Document, ID_FIELD};

/// Values longer than this render as a multi-line editor
pub const LONG_VALUE_CHARS: usize = 50;

const MIN_MULTILINE_ROWS: usize = 2;
const MAX_MULTILINE_ROWS: usize = 10;

/// How a single value is shown in an editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub text: String,
    pub multiline: bool,
    /// Editor height in lines, proportional to the value's length
    pub rows: usize,
}

pub fn render_cell(value: &Value) -> CellView {
    let text = stringify(value);
    let len = text.chars().count();
    if len > LONG_VALUE_CHARS {
        let rows = len
            .div_ceil(LONG_VALUE_CHARS)
            .clamp(MIN_MULTILINE_ROWS, MAX_MULTILINE_ROWS);
        CellView {
            text,
            multiline: true,
            rows,
        }
    } else {
        CellView {
            text,
            multiline: false,
            rows: 1,
        }
    }
}

/// Column names taken from the first document: `_id`, then its fields in order.
/// Empty when there are no documents.
pub fn columns(docs: &[Document]) -> Vec<String> {
    match docs.first() {
        Some(first) => std::iter::once(ID_FIELD.to_string())
            .chain(first.fields.keys().cloned())
            .collect(),
        None => Vec::new(),
    }
}

/// Full-document view used when a row is expanded: every field with its
/// editor layout, `_id` first
pub fn expand(doc: &Document) -> Vec<(String, CellView)> {
    std::iter::once((ID_FIELD.to_string(), render_cell(&doc.id.to_value())))
        .chain(
            doc.fields
                .iter()
                .map(|(k, v)| (k.clone(), render_cell(v))),
        )
        .collect()
}
