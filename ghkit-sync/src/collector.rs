//! Paginated collection.
//!
//! [`PageStream`] drives any cursor-paged query one blocking request at a
//! time. It is bounded (`max_pages`), refuses to loop on a cursor that does
//! not advance, and exposes the cursor it will request next so a caller could
//! checkpoint it. Nothing is checkpointed today: any failed page aborts the
//! whole collection and the caller restarts from page one.

use ghkit_core::{Config, Owner, ProjectNumber};
use ghkit_gateway::{
    Cursor, GatewayError, Page, PageRequest, ProjectItem, ProjectSummary, QueryGateway,
};

use crate::error::SyncError;
use crate::validate;

/// Page size and page bound for every paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            page_size: ghkit_core::config::DEFAULT_PAGE_SIZE,
            max_pages: ghkit_core::config::DEFAULT_MAX_PAGES,
        }
    }
}

impl From<&Config> for CollectOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }
}

// ---------------------------------------------------------------------------
// PageStream
// ---------------------------------------------------------------------------

/// Iterator over the pages of one paged query.
pub struct PageStream<T, F>
where
    F: FnMut(&PageRequest) -> Result<Page<T>, GatewayError>,
{
    fetch: F,
    options: CollectOptions,
    cursor: Option<Cursor>,
    pages_fetched: u32,
    done: bool,
}

impl<T, F> PageStream<T, F>
where
    F: FnMut(&PageRequest) -> Result<Page<T>, GatewayError>,
{
    pub fn new(options: CollectOptions, fetch: F) -> Self {
        Self {
            fetch,
            options,
            cursor: None,
            pages_fetched: 0,
            done: false,
        }
    }

    /// The cursor the next request will send (`None` before page one).
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    fn fail(&mut self, err: SyncError) -> Option<Result<Page<T>, SyncError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<T, F> Iterator for PageStream<T, F>
where
    F: FnMut(&PageRequest) -> Result<Page<T>, GatewayError>,
{
    type Item = Result<Page<T>, SyncError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.pages_fetched >= self.options.max_pages {
            return self.fail(SyncError::PageLimit {
                limit: self.options.max_pages,
            });
        }

        let request = PageRequest::after(self.options.page_size, self.cursor.clone());
        let page = match (self.fetch)(&request) {
            Ok(page) => page,
            Err(err) => return self.fail(err.into()),
        };
        self.pages_fetched += 1;
        tracing::debug!(
            "page {} ({} items, more: {})",
            self.pages_fetched,
            page.items.len(),
            page.has_more
        );

        if !page.has_more {
            self.done = true;
            return Some(Ok(page));
        }
        match &page.next_cursor {
            None => self.fail(SyncError::Integrity(
                "remote reported more pages without a continuation cursor".to_string(),
            )),
            Some(next) if self.cursor.as_ref() == Some(next) => self.fail(SyncError::Integrity(
                format!("continuation cursor '{next}' did not advance"),
            )),
            Some(next) => {
                self.cursor = Some(next.clone());
                Some(Ok(page))
            }
        }
    }
}

/// Drain a stream into one list, preserving page order.
pub fn collect_all<T, F>(stream: PageStream<T, F>) -> Result<Vec<T>, SyncError>
where
    F: FnMut(&PageRequest) -> Result<Page<T>, GatewayError>,
{
    let mut accumulated = Vec::new();
    for page in stream {
        accumulated.extend(page?.items);
    }
    Ok(accumulated)
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Every item of a project plus the summary captured from page one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItems {
    pub summary: ProjectSummary,
    pub items: Vec<ProjectItem>,
}

/// Collect all items of project `number`.
///
/// Fails with an integrity error if the item count does not match the
/// `totalCount` reported on the first page.
pub fn collect_project_items<G: QueryGateway>(
    gateway: &G,
    owner: &Owner,
    number: ProjectNumber,
    options: CollectOptions,
) -> Result<ProjectItems, SyncError> {
    validate::owner(owner)?;
    validate::project_number(number)?;

    let mut summary: Option<ProjectSummary> = None;
    let stream = PageStream::new(options, |request: &PageRequest| {
        let page = gateway.project_items(owner, number, request)?;
        if summary.is_none() {
            summary = Some(page.summary);
        }
        Ok(page.page)
    });
    let items = collect_all(stream)?;

    let Some(summary) = summary else {
        return Err(SyncError::Integrity(format!(
            "project {number} returned no pages"
        )));
    };
    if items.len() as u64 != summary.total_count {
        return Err(SyncError::Integrity(format!(
            "project {number}: collected {} items but the first page reported {}",
            items.len(),
            summary.total_count
        )));
    }
    tracing::debug!("project {number}: collected {} items", items.len());
    Ok(ProjectItems { summary, items })
}

/// Every project number owned by the workspace, in remote order.
pub fn collect_workspace_projects<G: QueryGateway>(
    gateway: &G,
    owner: &Owner,
    options: CollectOptions,
) -> Result<Vec<ProjectNumber>, SyncError> {
    validate::owner(owner)?;
    collect_all(PageStream::new(options, |request: &PageRequest| {
        gateway.workspace_projects(owner, request)
    }))
}

/// Every repository name owned by the workspace, in remote order.
pub fn collect_workspace_repositories<G: QueryGateway>(
    gateway: &G,
    owner: &Owner,
    options: CollectOptions,
) -> Result<Vec<String>, SyncError> {
    validate::owner(owner)?;
    collect_all(PageStream::new(options, |request: &PageRequest| {
        gateway.workspace_repositories(owner, request)
    }))
}
