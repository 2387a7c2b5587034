//! Offset pagination primitives shared by list endpoints.
//!
//! A [`PageRequest`] captures the caller's `page`/`limit` query pair and a
//! [`Page`] couples one page of items with the collection total, from which
//! the response metadata (`pages`, `has_next`, `has_prev`) is derived.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default page size applied when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 20;

/// Upper bound on `limit` to keep a single page bounded.
pub const MAX_LIMIT: u32 = 100;

/// A validated page/limit pair. Both components are always at least 1 and
/// `limit` never exceeds [`MAX_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a request, clamping out-of-range values instead of failing:
    /// `page` and `limit` are raised to 1, `limit` is capped at
    /// [`MAX_LIMIT`].
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// The 1-based page index.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for an offset/limit query.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_LIMIT)
    }
}

/// One page of items together with the collection total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in query order.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// The request that produced this page.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Couple a page of items with the collection total.
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// Number of pages in the collection; at least 1 even when empty.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.request.limit())).max(1)
    }

    /// Whether a page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.request.page()) < self.total_pages()
    }

    /// Whether a page precedes this one.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.request.page() > 1
    }

    /// Response metadata for this page.
    #[must_use]
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            page: self.request.page(),
            size: self.items.len() as u64,
            total: self.total,
            pages: self.total_pages(),
        }
    }

    /// Map the page items, keeping the pagination bookkeeping intact.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// Serialised pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    /// 1-based page index of this response.
    pub page: u32,
    /// Number of items on this page.
    pub size: u64,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages; at least 1.
    pub pages: u64,
}
