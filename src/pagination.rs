//! pagination helpers
//!
//! generic paginator with a seen-cursor guard, plus adapters that turn rest
//! offset pages and graphql connections into [`Page`] values.
//!
//! every cursor handed to the fetch function is remembered for the life of
//! the walk. a cursor that comes back a second time aborts the walk with
//! [`Error::PaginationStalled`]; it never means "more data".

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use tracing::debug;

/// page size used when a caller passes zero
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// a single page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, C> {
    /// items on this page, in server order
    pub items: Vec<T>,
    /// cursor for the next page; `None` ends the walk
    pub next_cursor: Option<C>,
}

impl<T, C> Page<T, C> {
    /// a page with more to come
    pub fn more(items: Vec<T>, next_cursor: C) -> Self {
        Self {
            items,
            next_cursor: Some(next_cursor),
        }
    }

    /// the final page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

/// generic paginator
pub struct Paginator<T, C, R, Fetch, Fut, Extract>
where
    C: Clone + Eq + Hash + Display,
    Fetch: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<R>>,
    Extract: FnMut(R) -> Result<Page<T, C>>,
{
    fetch: Fetch,
    extract: Extract,
    cursor: Option<C>,
    seen: HashSet<C>,
    pages: usize,
    done: bool,
    _phantom: std::marker::PhantomData<(T, R)>,
}

impl<T, C, R, Fetch, Fut, Extract> Paginator<T, C, R, Fetch, Fut, Extract>
where
    C: Clone + Eq + Hash + Display,
    Fetch: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<R>>,
    Extract: FnMut(R) -> Result<Page<T, C>>,
{
    /// create a new paginator starting at the first page
    pub fn new(fetch: Fetch, extract: Extract) -> Self {
        Self {
            fetch,
            extract,
            cursor: None,
            seen: HashSet::new(),
            pages: 0,
            done: false,
            _phantom: std::marker::PhantomData,
        }
    }

    /// start the walk at `cursor` instead of the first page
    pub fn starting_at(mut self, cursor: Option<C>) -> Self {
        self.cursor = cursor;
        self
    }

    /// number of pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// fetch the next page of results
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }

        if let Some(cursor) = &self.cursor {
            if !self.seen.insert(cursor.clone()) {
                self.done = true;
                return Err(Error::PaginationStalled {
                    cursor: cursor.to_string(),
                });
            }
        }

        let response = (self.fetch)(self.cursor.clone()).await?;
        let page = (self.extract)(response)?;
        self.pages += 1;
        debug!(
            page = self.pages,
            items = page.items.len(),
            next_cursor = ?page.next_cursor.as_ref().map(ToString::to_string),
            "fetched page"
        );

        self.cursor = page.next_cursor;
        if self.cursor.is_none() {
            self.done = true;
        }

        Ok(Some(page.items))
    }

    /// fetch all pages and return a single collection
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// walk every page from `initial` and concatenate the items in fetch order
pub async fn paginate<T, C, Fetch, Fut>(initial: Option<C>, fetch: Fetch) -> Result<Vec<T>>
where
    C: Clone + Eq + Hash + Display,
    Fetch: FnMut(Option<C>) -> Fut,
    Fut: Future<Output = Result<Page<T, C>>>,
{
    Paginator::new(fetch, Ok).starting_at(initial).collect_all().await
}

/// rest offset page (`startAt` / `maxResults` / `total` / `isLast`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage<T> {
    #[serde(default)]
    pub start_at: Option<u64>,
    #[serde(default)]
    pub max_results: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub is_last: Option<bool>,
    /// items; search calls this `issues`, the worklog listing `worklogs`.
    /// required so an unknown item key fails instead of ending the walk
    #[serde(alias = "issues", alias = "worklogs")]
    pub values: Vec<T>,
}

impl<T> OffsetPage<T> {
    /// convert into a page whose cursor is the next `startAt`
    ///
    /// `requested_start` is used when the server omits `startAt`;
    /// `page_size` is the `maxResults` the caller asked for.
    pub fn into_page(self, requested_start: u64, page_size: u64) -> Page<T, u64> {
        let start = self.start_at.unwrap_or(requested_start);
        let len = self.values.len() as u64;
        let next = start + len;

        let last = len == 0
            || self.is_last == Some(true)
            || match self.total {
                Some(total) => next >= total,
                None => len < page_size,
            };

        if last {
            Page::last(self.values)
        } else {
            Page::more(self.values, next)
        }
    }
}

/// relay `pageInfo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// relay edge
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<N> {
    #[serde(default)]
    pub cursor: Option<String>,
    pub node: Option<N>,
}

/// relay connection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<N>>,
    pub page_info: PageInfo,
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl<N> Connection<N> {
    /// next cursor: `endCursor`, else the last edge cursor
    ///
    /// `path` names the connection in the error raised when the server
    /// reports another page without any cursor to reach it.
    pub fn next_cursor(&self, path: &str) -> Result<Option<String>> {
        if !self.page_info.has_next_page {
            return Ok(None);
        }

        let end_cursor = self
            .page_info
            .end_cursor
            .as_deref()
            .map(str::trim)
            .filter(|cursor| !cursor.is_empty());
        let edge_cursor = self
            .edges
            .iter()
            .rev()
            .filter_map(|edge| edge.cursor.as_deref().map(str::trim))
            .find(|cursor| !cursor.is_empty());

        match end_cursor.or(edge_cursor) {
            Some(cursor) => Ok(Some(cursor.to_string())),
            None => Err(Error::PaginationCursorMissing {
                path: path.to_string(),
            }),
        }
    }

    /// convert into a page of non-null nodes
    pub fn into_page(self, path: &str) -> Result<Page<N, String>> {
        let next_cursor = self.next_cursor(path)?;
        let items = self.edges.into_iter().filter_map(|edge| edge.node).collect();
        Ok(Page { items, next_cursor })
    }
}

/// clamp a caller page size, treating zero as the default
pub(crate) fn page_size_or_default(size: u32) -> u32 {
    if size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size
    }
}
