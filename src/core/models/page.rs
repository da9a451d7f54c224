//! Pagination for listing operations

use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: usize = 50;
const MAX_PER_PAGE: usize = 500;

/// Which page to return (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

const fn default_page() -> usize {
    1
}

const fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Build a request, clamping out-of-range values
    #[must_use]
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    const fn offset(self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Page number
    pub page: usize,
    /// Page size used
    pub per_page: usize,
    /// Total number of matching items
    pub total: usize,
}

impl<T> Page<T> {
    /// Cut one page out of a sequence, counting the total as it goes
    pub fn paginate(items: impl IntoIterator<Item = T>, request: PageRequest) -> Self {
        let request = Self::normalize(request);
        let offset = request.offset();
        let mut total = 0;
        let mut page_items = Vec::new();
        for item in items {
            if total >= offset && page_items.len() < request.per_page {
                page_items.push(item);
            }
            total += 1;
        }
        Self {
            items: page_items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// Number of pages the total spans
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.total.div_ceil(self.per_page)
    }

    fn normalize(request: PageRequest) -> PageRequest {
        PageRequest::new(request.page, request.per_page)
    }
}
