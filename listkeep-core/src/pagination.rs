//! Pagination request and response envelopes.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Build a page request, rejecting a zero page or page size.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if page_size == 0 {
            return Err(ValidationError::InvalidValue {
                field: "page_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { page, page_size })
    }

    /// Number of items preceding this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }
}

/// One page of an ordered collection plus total-count metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedSlice<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> PaginatedSlice<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_count,
        }
    }

    /// Total number of pages at this page size (0 for an empty collection).
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size.max(1)))
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedSlice<U> {
        PaginatedSlice {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}
