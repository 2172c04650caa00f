//! Cursor pagination primitives shared by every paged query.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque continuation token handed back by a paged query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One page worth of request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub first: u32,
    pub after: Option<Cursor>,
}

impl PageRequest {
    pub fn first(first: u32) -> Self {
        Self { first, after: None }
    }

    pub fn after(first: u32, cursor: Option<Cursor>) -> Self {
        Self {
            first,
            after: cursor,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
    /// Total across all pages, when the query reports it.
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            has_more: false,
            total_count: None,
        }
    }
}

/// GraphQL `pageInfo` block.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

/// GraphQL connection: `{ totalCount, pageInfo, nodes }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Connection<N> {
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<N>,
}

impl<N> Connection<N> {
    pub fn into_page<T>(self, map: impl FnMut(N) -> T) -> Page<T> {
        Page {
            items: self.nodes.into_iter().map(map).collect(),
            next_cursor: self.page_info.end_cursor.map(Cursor),
            has_more: self.page_info.has_next_page,
            total_count: self.total_count,
        }
    }
}
