//! # Pagination
//!
//! `page`/`limit` query parameters and the standard response envelope:
//!
//! ```json
//! {
//!   "data": [ ... ],
//!   "pagination": {
//!     "currentPage": 1,
//!     "totalPages": 5,
//!     "totalItems": 93,
//!     "itemsPerPage": 20
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Default page size when `limit` is absent.
const DEFAULT_LIMIT: i64 = 20;

/// Upper bound on `limit` to keep responses sane.
const MAX_LIMIT: i64 = 100;

/// `page`/`limit` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Normalizes to a 1-based page and a clamped limit.
    pub fn normalize(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (page, limit)
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

/// A page of results with its pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    /// Builds the envelope from a fetched page and the total row count.
    pub fn new(data: Vec<T>, page: i64, limit: i64, total_items: i64) -> Self {
        let total_pages = if total_items == 0 {
            0
        } else {
            (total_items + limit - 1) / limit
        };

        Paginated {
            data,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total_items,
                items_per_page: limit,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        let params = PageParams::default();
        assert_eq!(params.normalize(), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn test_normalize_clamps() {
        let params = PageParams {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(params.normalize(), (1, MAX_LIMIT));

        let params = PageParams {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(params.normalize(), (1, 1));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Paginated<i64> = Paginated::new(vec![], 1, 20, 93);
        assert_eq!(page.pagination.total_pages, 5);

        let page: Paginated<i64> = Paginated::new(vec![], 1, 20, 40);
        assert_eq!(page.pagination.total_pages, 2);

        let page: Paginated<i64> = Paginated::new(vec![], 1, 20, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }
}
