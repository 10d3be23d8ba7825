//! New-document form

use serde_json::{Map, Value};

use super::edit::parse_input;
use crate::document::Document;
use crate::error::{PanelError, Result};

/// One key/value row of the form. Seeded keys are locked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormRow {
    pub key: String,
    pub value: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewDocumentForm {
    rows: Vec<FormRow>,
}

impl NewDocumentForm {
    /// Seed keys from the first loaded document so new documents keep the
    /// collection's shape. An empty collection starts with one free row.
    pub fn seeded(docs: &[Document]) -> Self {
        let rows: Vec<FormRow> = match docs.first() {
            Some(first) => first
                .fields
                .keys()
                .map(|key| FormRow {
                    key: key.clone(),
                    value: String::new(),
                    locked: true,
                })
                .collect(),
            None => Vec::new(),
        };
        let mut form = NewDocumentForm { rows };
        if form.rows.is_empty() {
            form.add_field();
        }
        form
    }

    pub fn rows(&self) -> &[FormRow] {
        &self.rows
    }

    /// Append an empty, editable row; returns its index
    pub fn add_field(&mut self) -> usize {
        self.rows.push(FormRow::default());
        self.rows.len() - 1
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut FormRow> {
        self.rows
            .get_mut(index)
            .ok_or_else(|| PanelError::validation(format!("no form row {}", index + 1)))
    }

    pub fn set_key(&mut self, index: usize, key: &str) -> Result<()> {
        let row = self.row_mut(index)?;
        if row.locked {
            return Err(PanelError::validation(format!(
                "field '{}' comes from the collection and cannot be renamed",
                row.key
            )));
        }
        row.key = key.trim().to_string();
        Ok(())
    }

    pub fn set_value(&mut self, index: usize, value: &str) -> Result<()> {
        self.row_mut(index)?.value = value.to_string();
        Ok(())
    }

    /// Set the value of the row named `key`, adding a row if there is none
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(PanelError::validation("field name is required"));
        }
        let index = match self.rows.iter().position(|r| r.key == key) {
            Some(index) => index,
            None => match self.rows.iter().position(|r| r.key.is_empty()) {
                Some(free) => free,
                None => self.add_field(),
            },
        };
        let row = &mut self.rows[index];
        row.key = key.to_string();
        row.value = value.to_string();
        Ok(())
    }

    /// The document body to insert. Rows without a key are skipped; at least
    /// one keyed row is required.
    pub fn build(&self) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        for row in self.rows.iter().filter(|r| !r.key.is_empty()) {
            doc.insert(row.key.clone(), parse_input(&row.value));
        }
        if doc.is_empty() {
            return Err(PanelError::validation("at least one field is required"));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seeded_from_first_document() {
        let docs = vec![
            Document::from_value(json!({"_id": 1, "name": "a", "age": 2})).unwrap(),
            Document::from_value(json!({"_id": 2, "other": true})).unwrap(),
        ];
        let form = NewDocumentForm::seeded(&docs);
        let keys: Vec<&str> = form.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "age"]);
        assert!(form.rows().iter().all(|r| r.locked));
    }

    #[test]
    fn test_empty_collection_gets_free_row() {
        let mut form = NewDocumentForm::seeded(&[]);
        assert_eq!(form.rows().len(), 1);
        assert!(!form.rows()[0].locked);
        form.set_key(0, "title").unwrap();
        form.set_value(0, "Hello").unwrap();
        assert_eq!(form.build().unwrap(), json!({"title": "Hello"}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_locked_keys_cannot_be_renamed() {
        let docs = vec![Document::from_value(json!({"_id": 1, "name": "a"})).unwrap()];
        let mut form = NewDocumentForm::seeded(&docs);
        assert!(form.set_key(0, "other").is_err());
        let extra = form.add_field();
        form.set_key(extra, "extra").unwrap();
        assert!(form.set_key(9, "x").is_err());
    }

    #[test]
    fn test_build_requires_a_key() {
        let form = NewDocumentForm::seeded(&[]);
        assert!(matches!(form.build(), Err(PanelError::Validation(_))));
    }

    #[test]
    fn test_set_by_key_parses_values() {
        let docs = vec![Document::from_value(json!({"_id": 1, "n": 1})).unwrap()];
        let mut form = NewDocumentForm::seeded(&docs);
        form.set("n", "5").unwrap();
        form.set("tags", r#"["a","b"]"#).unwrap();
        form.set("note", "free text").unwrap();
        assert_eq!(
            Value::Object(form.build().unwrap()),
            json!({"n": 5, "tags": ["a", "b"], "note": "free text"})
        );
    }

    #[test]
    fn test_seeded_rows_left_blank_are_empty_strings() {
        let docs = vec![Document::from_value(json!({"_id": 1, "a": 1, "b": 2})).unwrap()];
        let mut form = NewDocumentForm::seeded(&docs);
        form.set("a", "7").unwrap();
        assert_eq!(Value::Object(form.build().unwrap()), json!({"a": 7, "b": ""}));
    }
}
