//! Search filtering and pagination over the local mirror

use serde::Serialize;

use crate::records::Record;

/// Records shown per page
pub const PAGE_SIZE: usize = 15;

/// Records whose location or regions contain `term`, case-insensitively.
///
/// An empty term matches everything. Order is preserved.
pub fn filter_records<'a>(records: &'a [Record], term: &str) -> Vec<&'a Record> {
    let needle = term.to_lowercase();
    records.iter().filter(|r| r.matches(&needle)).collect()
}

/// Number of pages needed for `count` records (0 when there are none)
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// The slice of `items` shown on the 1-based `page`.
///
/// A page past the end yields an empty slice.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// What the table shows for the current search and page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    /// Records on this page
    pub records: Vec<Record>,
    /// Current 1-based page index
    pub page: usize,
    /// `ceil(total_matches / PAGE_SIZE)`
    pub total_pages: usize,
    /// Size of the filtered set
    pub total_matches: usize,
}

impl PageView {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// True when the stored page lies beyond the filtered set
    pub fn is_stale(&self) -> bool {
        self.page > self.total_pages.max(1)
    }
}
