//! Current database/collection selection and row selection

use std::fmt;

use crate::document::DocumentId;

/// Which collection the browser is looking at. Passed around by value;
/// switching collections means building a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewState {
    pub database: String,
    pub collection: String,
}

impl ViewState {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        ViewState {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Rows picked for a bulk delete, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<DocumentId>,
}

impl Selection {
    /// Add `id`, or remove it if already selected. Returns whether it is now selected.
    pub fn toggle(&mut self, id: DocumentId) -> bool {
        match self.ids.iter().position(|s| *s == id) {
            Some(pos) => {
                self.ids.remove(pos);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        }
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_display() {
        assert_eq!(ViewState::new("shop", "orders").to_string(), "shop.orders");
    }

    #[test]
    fn test_selection_toggle() {
        let mut sel = Selection::default();
        assert!(sel.toggle(DocumentId::Int(1)));
        assert!(sel.toggle(DocumentId::from("b")));
        assert!(!sel.toggle(DocumentId::Int(1)));
        assert_eq!(sel.ids(), &[DocumentId::from("b")]);
        assert!(!sel.contains(&DocumentId::Int(1)));
        sel.clear();
        assert!(sel.is_empty());
    }
}
