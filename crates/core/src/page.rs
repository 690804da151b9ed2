//! Pagination for search results.

use serde::{Deserialize, Serialize};

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub index: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { index: 1, size: 20 }
    }
}

impl PageRequest {
    /// Normalizes out-of-range values: index 0 becomes 1, size is clamped to `1..=max_size`.
    pub fn new(index: u32, size: u32, max_size: u32) -> Self {
        Self {
            index: index.max(1),
            size: size.clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        (self.index.max(1) as usize - 1) * self.size as usize
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Slice an already filtered and ordered result set.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.limit())
            .collect();
        Self {
            items,
            total,
            request,
        }
    }

    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.request.size.max(1));
        self.total.div_ceil(size)
    }

    pub fn has_more(&self) -> bool {
        u64::from(self.request.index) < self.page_count()
    }
}
