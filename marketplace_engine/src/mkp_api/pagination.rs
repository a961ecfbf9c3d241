//! Page-number pagination.
//!
//! Clients ask for a `page` (1-based) and optionally a `page_size`. Page sizes that are missing, malformed or
//! non-positive fall back to [`DEFAULT_PAGE_SIZE`], and are capped at [`MAX_PAGE_SIZE`]. A malformed page number, or
//! one past the last page, is an [`InvalidPage`] error. The first page is always valid, even when there are no
//! results.
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid page.")]
pub struct InvalidPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Result<Self, InvalidPage> {
        if page < 1 {
            return Err(InvalidPage);
        }
        let page_size = if page_size < 1 { DEFAULT_PAGE_SIZE } else { page_size.min(MAX_PAGE_SIZE) };
        // The offset must be representable
        (page - 1).checked_mul(page_size).ok_or(InvalidPage)?;
        Ok(Self { page, page_size })
    }

    /// Builds a `Pagination` from raw query string values.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Result<Self, InvalidPage> {
        let page = match page.map(str::trim) {
            None | Some("") => 1,
            Some(p) => p.parse::<i64>().map_err(|_| InvalidPage)?,
        };
        let page_size = page_size.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, page_size)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// One page of results, along with the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: i64, pagination: Pagination) -> Result<Self, InvalidPage> {
        let num_pages = num_pages(count, pagination.page_size);
        let page = pagination.page;
        if page > num_pages {
            return Err(InvalidPage);
        }
        let next = (page < num_pages).then_some(page + 1);
        let previous = (page > 1).then_some(page - 1);
        Ok(Self { count, page, page_size: pagination.page_size, next, previous, results })
    }

    pub fn num_pages(&self) -> i64 {
        num_pages(self.count, self.page_size)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

fn num_pages(count: i64, page_size: i64) -> i64 {
    ((count + page_size - 1) / page_size).max(1)
}
