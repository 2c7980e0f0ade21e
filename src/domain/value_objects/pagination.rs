//! Offset pagination shared by list endpoints.

use serde::Serialize;

/// Default page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Normalize raw query values: page defaults to 1, size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self::with_default_size(page, page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn with_default_size(page: Option<u32>, page_size: Option<u32>, default_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let size = request.page_size as i64;
        let total_pages = ((total_items + size - 1) / size) as u32;
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages,
        }
    }

    /// Convert the items while keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let req = PageRequest::new(Some(0), Some(10_000));
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);

        let req = PageRequest::new(Some(3), Some(0));
        assert_eq!(req.page_size, 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn test_offset() {
        let req = PageRequest::new(Some(4), Some(12));
        assert_eq!(req.offset(), 36);
        assert_eq!(req.limit(), 12);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(Some(1), Some(10));
        assert_eq!(Page::new(Vec::<u8>::new(), req, 0).total_pages, 0);
        assert_eq!(Page::new(Vec::<u8>::new(), req, 10).total_pages, 1);
        assert_eq!(Page::new(Vec::<u8>::new(), req, 11).total_pages, 2);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let req = PageRequest::new(Some(2), Some(2));
        let page = Page::new(vec![1, 2], req, 5).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
    }
}
