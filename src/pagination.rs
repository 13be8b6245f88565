//! Page-based pagination shared by the user list and the activity log.

use serde::{Deserialize, Serialize};

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_per_page() -> u32 {
    20
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (1-indexed).
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page > 0 {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    /// Slice an already filtered and ordered collection into one page.
    pub fn from_vec(all: Vec<T>, page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let total = all.len() as u64;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = all.into_iter().skip(skip).take(per_page as usize).collect();

        Self::new(items, total, page, per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Convert the items while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let r: PaginatedResult<u8> = PaginatedResult::new(vec![], 41, 1, 20);
        assert_eq!(r.total_pages, 3);
        assert!(r.has_next());
        assert!(!r.has_prev());

        let r: PaginatedResult<u8> = PaginatedResult::new(vec![], 0, 1, 20);
        assert_eq!(r.total_pages, 0);
    }

    #[test]
    fn test_from_vec() {
        let r = PaginatedResult::from_vec((1..=5).collect::<Vec<_>>(), 2, 2);
        assert_eq!(r.items, vec![3, 4]);
        assert_eq!(r.total, 5);
        assert_eq!(r.total_pages, 3);

        let r = PaginatedResult::from_vec((1..=5).collect::<Vec<_>>(), 9, 2);
        assert!(r.items.is_empty());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let r = PaginatedResult::from_vec(vec![1, 2, 3], 1, 2).map(|n| n * 10);
        assert_eq!(r.items, vec![10, 20]);
        assert_eq!(r.total, 3);
    }
}
