//! Table pagination

use crate::error::{PanelError, Result};

/// Row counts a table page may show
pub const PER_PAGE_CHOICES: [usize; 5] = [10, 15, 20, 25, 30];

pub const DEFAULT_PER_PAGE: usize = 10;

/// 1-based page cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    per_page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Pager {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pager {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Number of pages for `total` rows; an empty table still has one page
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page).max(1)
    }

    /// Move to `page`, clamped into `1..=page_count(total)`
    pub fn go_to(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.page_count(total));
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Change the page size; only the listed choices are accepted.
    /// Goes back to the first page.
    pub fn set_per_page(&mut self, per_page: usize) -> Result<()> {
        if !PER_PAGE_CHOICES.contains(&per_page) {
            return Err(PanelError::validation(format!(
                "rows per page must be one of {:?}",
                PER_PAGE_CHOICES
            )));
        }
        self.per_page = per_page;
        self.page = 1;
        Ok(())
    }

    /// Rows of the current page. A page past the end (after the data shrank)
    /// shows the last page instead.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let page = self.page.min(self.page_count(rows.len()));
        let start = (page - 1) * self.per_page;
        let end = (start + self.per_page).min(rows.len());
        &rows[start.min(rows.len())..end]
    }

    /// 1-based index of the first row on the current page, for display
    pub fn first_row(&self, total: usize) -> usize {
        let page = self.page.min(self.page_count(total));
        (page - 1) * self.per_page + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        let pager = Pager::default();
        assert_eq!(pager.page_count(0), 1);
        assert_eq!(pager.page_count(10), 1);
        assert_eq!(pager.page_count(11), 2);
        assert_eq!(pager.page_count(30), 3);
    }

    #[test]
    fn test_slice_pages() {
        let rows: Vec<usize> = (1..=23).collect();
        let mut pager = Pager::default();
        assert_eq!(pager.slice(&rows), &rows[0..10]);

        pager.go_to(3, rows.len());
        assert_eq!(pager.slice(&rows), &[21, 22, 23]);
        assert_eq!(pager.first_row(rows.len()), 21);
    }

    #[test]
    fn test_go_to_clamps() {
        let mut pager = Pager::default();
        pager.go_to(0, 25);
        assert_eq!(pager.page(), 1);
        pager.go_to(99, 25);
        assert_eq!(pager.page(), 3);
    }

    #[test]
    fn test_shrunk_data_shows_last_page() {
        let mut pager = Pager::default();
        pager.go_to(3, 30);
        let rows: Vec<usize> = (1..=12).collect();
        assert_eq!(pager.slice(&rows), &[11, 12]);

        let empty: Vec<usize> = Vec::new();
        assert!(pager.slice(&empty).is_empty());
    }

    #[test]
    fn test_per_page_choices() {
        let mut pager = Pager::default();
        pager.go_to(2, 40);
        pager.set_per_page(20).unwrap();
        assert_eq!(pager.per_page(), 20);
        assert_eq!(pager.page(), 1);
        assert!(pager.set_per_page(7).is_err());
        assert_eq!(pager.per_page(), 20);
    }
}
