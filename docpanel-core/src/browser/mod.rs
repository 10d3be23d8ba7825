//! Client-side browsing state
//!
//! Everything a browser front end keeps between requests: which collection is
//! open, the loaded documents, search, paging, staged edits, row selection and
//! the new-document form. None of it talks to a store directly; mutations go
//! through a [`Gateway`](crate::gateway::Gateway).

mod edit;
mod form;
mod pager;
mod render;
mod search;
mod session;
mod view;

pub use edit::{parse_input, EditBuffer};
pub use form::{FormRow, NewDocumentForm};
pub use pager::{Pager, DEFAULT_PER_PAGE, PER_PAGE_CHOICES};
pub use render::{columns, expand, render_cell, CellView, LONG_VALUE_CHARS};
pub use search::{stringify, SearchFilter, SearchScope};
pub use session::Session;
pub use view::{Selection, ViewState};
