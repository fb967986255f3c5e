//! Wire shapes of the REST API: request options, response envelopes,
//! pagination and rate-limit telemetry.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

// =============================================================================
// REQUEST OPTIONS
// =============================================================================

/// Query modifiers for a single call. Empty fields add no parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub filters: BTreeMap<String, String>,
    /// Sort key, sent verbatim. A leading `-` means descending.
    pub sort: Option<String>,
    pub include: Vec<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, key: impl Into<String>) -> Self {
        self.sort = Some(key.into());
        self
    }

    #[must_use]
    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.include.push(relation.into());
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Query parameters in the panel's `filter[..]`/`sort`/`include`/`page`
    /// convention.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(field, value)| (format!("filter[{field}]"), value.clone()))
            .collect();

        if let Some(sort) = self.sort.as_deref().filter(|sort| !sort.is_empty()) {
            pairs.push(("sort".to_owned(), sort.to_owned()));
        }
        if !self.include.is_empty() {
            pairs.push(("include".to_owned(), self.include.join(",")));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".to_owned(), per_page.to_string()));
        }
        pairs
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// `{ object, attributes }` wrapper around a single resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub object: String,
    pub attributes: T,
}

/// `{ object: "list", data, meta? }` wrapper around a resource collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub object: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<Envelope<T>>,
    #[serde(default)]
    pub meta: Option<ListMeta>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

/// Pagination block exactly as the panel sends it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPagination {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(default)]
    pub links: PaginationLinks,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Pagination metadata handed back to callers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(default)]
    pub links: PaginationLinks,
}

impl Pagination {
    /// Metadata describing one full page of `len` items.
    #[must_use]
    pub fn single_page(len: usize) -> Self {
        let len = u64::try_from(len).unwrap_or(u64::MAX);
        Self {
            total: len,
            count: len,
            per_page: len,
            current_page: 1,
            total_pages: 1,
            links: PaginationLinks::default(),
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

impl From<RawPagination> for Pagination {
    fn from(raw: RawPagination) -> Self {
        Self {
            total: raw.total,
            count: raw.count,
            per_page: raw.per_page,
            current_page: raw.current_page,
            total_pages: raw.total_pages,
            links: raw.links,
        }
    }
}

/// An unwrapped list response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListEnvelope<T> {
    /// Strip every element down to its attributes, keeping order, and
    /// synthesize single-page metadata when the panel sent none.
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        let data: Vec<T> = self.data.into_iter().map(|item| item.attributes).collect();
        let pagination = self
            .meta
            .and_then(|meta| meta.pagination)
            .map_or_else(|| Pagination::single_page(data.len()), Pagination::from);
        Page { data, pagination }
    }
}

// =============================================================================
// RATE LIMIT
// =============================================================================

/// Quota counters reported by the most recent response that carried them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    /// Unix epoch seconds at which the window resets.
    pub reset: u64,
}

impl RateLimit {
    /// Read the three `X-RateLimit-*` headers. Returns `None` unless all
    /// three are present and numeric.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
        };

        Some(Self {
            limit: read(RATE_LIMIT_LIMIT_HEADER)?,
            remaining: read(RATE_LIMIT_REMAINING_HEADER)?,
            reset: read(RATE_LIMIT_RESET_HEADER)?,
        })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
