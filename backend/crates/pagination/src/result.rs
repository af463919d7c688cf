//! One page of items together with its navigation metadata.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize as DeriveSerialize};

use crate::Pagination;

/// Navigation metadata attached to every paginated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveSerialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationBlock {
    /// Number of rows matching the query across all pages.
    pub total: u64,
    /// One-based page that was returned.
    pub current_page: u32,
    /// Page size that was applied.
    pub per_page: u32,
    /// `ceil(total / per_page)`; zero when nothing matched.
    pub total_pages: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_previous_page: bool,
}

/// A page of items plus the total count of matching rows.
///
/// # Examples
/// ```
/// use pagination::{PaginatedResult, Pagination};
///
/// let page = PaginatedResult::new(vec!["a", "b"], 45, Pagination::new(1, 20));
/// assert_eq!(page.total_pages(), 3);
/// assert!(page.has_next_page());
/// assert!(!page.has_previous_page());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    items: Vec<T>,
    total: u64,
    pagination: Pagination,
}

impl<T> PaginatedResult<T> {
    /// Wrap one page of items.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            pagination,
        }
    }

    /// Items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of rows matching the query across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Window that produced this page.
    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Number of pages needed to show every matching row.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.pagination.per_page()))
    }

    /// Whether a later page exists.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        u64::from(self.pagination.page()) < self.total_pages()
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.pagination.page() > 1
    }

    /// Navigation metadata for this page.
    #[must_use]
    pub fn block(&self) -> PaginationBlock {
        PaginationBlock {
            total: self.total,
            current_page: self.pagination.page(),
            per_page: self.pagination.per_page(),
            total_pages: self.total_pages(),
            has_next_page: self.has_next_page(),
            has_previous_page: self.has_previous_page(),
        }
    }

    /// Transform every item while keeping the count and window.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> PaginatedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pagination: self.pagination,
        }
    }

    /// Split into items and navigation metadata.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, PaginationBlock) {
        let block = self.block();
        (self.items, block)
    }
}

impl<T: Serialize> Serialize for PaginatedResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PaginatedResult", 2)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("pagination", &self.block())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    //! Page arithmetic and wire-shape coverage.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(45, 20, 3)]
    #[case(40, 20, 2)]
    #[case(0, 20, 0)]
    #[case(1, 100, 1)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] per_page: i64, #[case] expected: u64) {
        let page = PaginatedResult::<()>::new(Vec::new(), total, Pagination::new(1, per_page));
        assert_eq!(page.total_pages(), expected);
    }

    #[rstest]
    #[case(1, true, false)]
    #[case(2, true, true)]
    #[case(3, false, true)]
    #[case(9, false, true)]
    fn navigation_flags_follow_position(
        #[case] current: i64,
        #[case] next: bool,
        #[case] previous: bool,
    ) {
        let page = PaginatedResult::<u8>::new(Vec::new(), 45, Pagination::new(current, 20));
        assert_eq!(page.has_next_page(), next);
        assert_eq!(page.has_previous_page(), previous);
    }

    #[rstest]
    fn empty_result_has_no_navigation() {
        let page = PaginatedResult::<u8>::new(Vec::new(), 0, Pagination::default());
        let block = page.block();
        assert_eq!(block.total_pages, 0);
        assert!(!block.has_next_page);
        assert!(!block.has_previous_page);
    }

    #[rstest]
    fn serialises_items_and_camel_case_block() {
        let page = PaginatedResult::new(vec![1, 2], 45, Pagination::new(2, 20));
        let value = serde_json::to_value(&page).expect("serialise page");
        assert_eq!(
            value,
            json!({
                "items": [1, 2],
                "pagination": {
                    "total": 45,
                    "currentPage": 2,
                    "perPage": 20,
                    "totalPages": 3,
                    "hasNextPage": true,
                    "hasPreviousPage": true
                }
            })
        );
    }

    #[rstest]
    fn map_keeps_window_and_total() {
        let page = PaginatedResult::new(vec![1, 2, 3], 3, Pagination::new(1, 5));
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items(), ["1", "2", "3"]);
        assert_eq!(mapped.total(), 3);
        assert_eq!(mapped.pagination().per_page(), 5);
    }

    #[rstest]
    fn into_parts_returns_matching_block() {
        let page = PaginatedResult::new(vec!['x'], 1, Pagination::default());
        let (items, block) = page.into_parts();
        assert_eq!(items, vec!['x']);
        assert_eq!(block.current_page, 1);
        assert_eq!(block.per_page, 20);
    }
}
