//! Client-side search over the loaded documents

use serde_json::Value;

use crate::document::{Document, ID_FIELD};

/// Which fields a search looks at
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Column(String),
}

/// Case-insensitive substring filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter {
    query: String,
    scope: SearchScope,
}

/// Text shown for a value in a table cell and used for matching
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Empty-ish values never match a column search
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl SearchFilter {
    pub fn new(query: impl Into<String>, scope: SearchScope) -> Self {
        SearchFilter {
            query: query.into(),
            scope,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn scope(&self) -> &SearchScope {
        &self.scope
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_scope(&mut self, scope: SearchScope) {
        self.scope = scope;
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        let hit = |text: String| text.to_lowercase().contains(&needle);

        match &self.scope {
            SearchScope::All => {
                hit(doc.id.to_string()) || doc.fields.values().any(|v| hit(stringify(v)))
            }
            SearchScope::Column(column) if column == ID_FIELD => hit(doc.id.to_string()),
            SearchScope::Column(column) => match doc.fields.get(column) {
                Some(value) if !is_blank(value) => hit(stringify(value)),
                _ => false,
            },
        }
    }

    /// Documents that pass the filter, in their original order
    pub fn apply<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        docs.iter().filter(|d| self.matches(d)).collect()
    }
}
