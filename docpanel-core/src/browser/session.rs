//! Browser session: one user's view of the gateway
//!
//! Holds the catalog, the selected collection's documents and every piece of
//! transient UI state. Each mutating action goes through the gateway and is
//! followed by a full re-fetch of the collection. A failed action leaves the
//! state as it was.

use serde_json::Value;

use super::edit::EditBuffer;
use super::form::NewDocumentForm;
use super::pager::Pager;
use super::search::{SearchFilter, SearchScope};
use super::view::{Selection, ViewState};
use crate::catalog::CatalogEntry;
use crate::document::{Document, DocumentId};
use crate::error::{PanelError, Result};
use crate::gateway::{BulkOutcome, Gateway};

pub struct Session<G: Gateway> {
    gateway: G,
    catalog: Vec<CatalogEntry>,
    view: Option<ViewState>,
    docs: Vec<Document>,
    filter: SearchFilter,
    pager: Pager,
    edits: EditBuffer,
    selection: Selection,
    form: Option<NewDocumentForm>,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G) -> Self {
        Session {
            gateway,
            catalog: Vec::new(),
            view: None,
            docs: Vec::new(),
            filter: SearchFilter::default(),
            pager: Pager::default(),
            edits: EditBuffer::new(),
            selection: Selection::default(),
            form: None,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn edits(&self) -> &EditBuffer {
        &self.edits
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn form(&self) -> Option<&NewDocumentForm> {
        self.form.as_ref()
    }

    fn current_view(&self) -> Result<ViewState> {
        self.view
            .clone()
            .ok_or_else(|| PanelError::validation("no collection selected"))
    }

    pub fn refresh_catalog(&mut self) -> Result<&[CatalogEntry]> {
        self.catalog = self.gateway.databases()?;
        Ok(&self.catalog)
    }

    /// Switch to another collection. Unsaved edits, selection, search and the
    /// new-document form belong to the previous collection and are dropped.
    pub fn select(&mut self, view: ViewState) -> Result<()> {
        let docs = self.gateway.documents(&view.database, &view.collection)?;
        self.view = Some(view);
        self.docs = docs;
        self.filter = SearchFilter::default();
        self.pager.reset();
        self.edits.clear();
        self.selection.clear();
        self.form = None;
        Ok(())
    }

    /// Leave the current collection
    pub fn close(&mut self) {
        self.view = None;
        self.docs.clear();
        self.filter = SearchFilter::default();
        self.pager.reset();
        self.edits.clear();
        self.selection.clear();
        self.form = None;
    }

    /// Re-fetch the selected collection
    pub fn reload(&mut self) -> Result<()> {
        let view = self.current_view()?;
        self.docs = self.gateway.documents(&view.database, &view.collection)?;
        let total = self.filtered().len();
        self.pager.go_to(self.pager.page(), total);
        Ok(())
    }

    pub fn set_search(&mut self, query: &str) {
        self.filter.set_query(query);
        self.pager.reset();
    }

    pub fn set_search_scope(&mut self, scope: SearchScope) {
        self.filter.set_scope(scope);
        self.pager.reset();
    }

    /// Loaded documents that pass the search filter
    pub fn filtered(&self) -> Vec<&Document> {
        self.filter.apply(&self.docs)
    }

    /// Rows of the current page
    pub fn visible(&self) -> Vec<&Document> {
        let filtered = self.filtered();
        self.pager.slice(&filtered).to_vec()
    }

    pub fn go_to_page(&mut self, page: usize) {
        let total = self.filtered().len();
        self.pager.go_to(page, total);
    }

    pub fn set_per_page(&mut self, per_page: usize) -> Result<()> {
        self.pager.set_per_page(per_page)
    }

    /// Document at 1-based `row` of the current page
    pub fn row(&self, row: usize) -> Result<&Document> {
        row.checked_sub(1)
            .and_then(|index| self.visible().get(index).copied())
            .ok_or_else(|| PanelError::validation(format!("no row {} on this page", row)))
    }

    fn row_id(&self, row: usize) -> Result<DocumentId> {
        Ok(self.row(row)?.id.clone())
    }

    /// Stage an inline edit of `field` on `row`; nothing is sent until `save_edits`
    pub fn stage_edit(&mut self, row: usize, field: &str, value: Value) -> Result<()> {
        let id = self.row_id(row)?;
        self.edits.stage(&id, field, value)
    }

    pub fn discard_edits(&mut self) {
        self.edits.clear();
    }

    /// Send every staged edit as one bulk update, then re-fetch
    pub fn save_edits(&mut self) -> Result<BulkOutcome> {
        let view = self.current_view()?;
        if self.edits.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let outcome =
            self.gateway
                .bulk_update(&view.database, &view.collection, self.edits.payloads())?;
        self.edits.clear();
        self.reload()?;
        Ok(outcome)
    }

    /// Save a whole-document edit from the expanded row editor
    pub fn update_row(&mut self, row: usize, patch: Value) -> Result<Document> {
        let view = self.current_view()?;
        let id = self.row_id(row)?;
        let doc = self
            .gateway
            .update(&view.database, &view.collection, &id, patch)?;
        self.reload()?;
        Ok(doc)
    }

    pub fn toggle_row(&mut self, row: usize) -> Result<bool> {
        let id = self.row_id(row)?;
        Ok(self.selection.toggle(id))
    }

    /// Delete every selected document, then re-fetch
    pub fn delete_selected(&mut self) -> Result<u64> {
        let view = self.current_view()?;
        if self.selection.is_empty() {
            return Err(PanelError::validation("no rows selected"));
        }
        let deleted = self
            .gateway
            .delete(&view.database, &view.collection, self.selection.ids())?;
        self.selection.clear();
        self.reload()?;
        Ok(deleted)
    }

    /// Open the new-document form, seeded from the loaded documents
    pub fn open_form(&mut self) -> Result<&mut NewDocumentForm> {
        self.current_view()?;
        Ok(self.form.insert(NewDocumentForm::seeded(&self.docs)))
    }

    pub fn form_mut(&mut self) -> Result<&mut NewDocumentForm> {
        self.form
            .as_mut()
            .ok_or_else(|| PanelError::validation("no new-document form is open"))
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
    }

    /// Insert the form's document, close the form and re-fetch
    pub fn submit_form(&mut self) -> Result<Document> {
        let view = self.current_view()?;
        let body = self
            .form
            .as_ref()
            .ok_or_else(|| PanelError::validation("no new-document form is open"))?
            .build()?;
        let doc = self
            .gateway
            .insert(&view.database, &view.collection, body)?;
        self.form = None;
        self.reload()?;
        Ok(doc)
    }

    /// Set `key` on every document of the collection, then re-fetch
    pub fn set_field_all(&mut self, key: &str, value: Option<Value>) -> Result<u64> {
        let view = self.current_view()?;
        let matched = self
            .gateway
            .set_field_all(&view.database, &view.collection, key, value)?;
        self.reload()?;
        Ok(matched)
    }
}
