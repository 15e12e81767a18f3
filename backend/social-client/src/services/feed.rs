/// Cursor-paged infinite feed
///
/// Pages are ordered by descending update time and each page's cursor is the
/// id of its last post. The backend resolves `cursorAfter` against the live
/// sort order, so a post that is updated (a like rewrites the document) while
/// the user scrolls can move across a page boundary and show up twice or not
/// at all. Nothing here deduplicates across pages.
use crate::backend::query::UPDATED_AT;
use crate::backend::{DocumentStore, Query};
use crate::domain::{PageCursor, Post};
use crate::error::SocialResult;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub items: Vec<Post>,
    /// Cursor for the following page; `None` once a page comes back empty
    pub next_cursor: Option<PageCursor>,
}

impl FeedPage {
    /// An empty page means the feed has no more posts
    pub fn is_exhausted(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone)]
pub struct FeedPager {
    store: Arc<dyn DocumentStore>,
    page_size: u32,
}

impl FeedPager {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn queries(&self, cursor: Option<&PageCursor>) -> Vec<Query> {
        let mut queries = vec![Query::order_desc(UPDATED_AT), Query::limit(self.page_size)];
        if let Some(cursor) = cursor {
            queries.push(Query::cursor_after(cursor.as_str()));
        }
        queries
    }

    /// Fetch the page after `cursor`, or the first page when no cursor is given
    pub async fn fetch_page(&self, cursor: Option<&PageCursor>) -> SocialResult<FeedPage> {
        let list = self.store.list_posts(&self.queries(cursor)).await?;
        let next_cursor = list
            .documents
            .last()
            .map(|post| PageCursor::new(post.id.clone()));

        debug!(
            cursor = ?cursor.map(PageCursor::as_str),
            items = list.documents.len(),
            "feed page fetched"
        );

        Ok(FeedPage {
            items: list.documents,
            next_cursor,
        })
    }
}

/// Pager state for one scrolling session
pub struct InfiniteFeed {
    pager: FeedPager,
    cursor: Option<PageCursor>,
    exhausted: bool,
    pages_loaded: usize,
}

impl InfiniteFeed {
    pub fn new(pager: FeedPager) -> Self {
        Self {
            pager,
            cursor: None,
            exhausted: false,
            pages_loaded: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    /// Load the next page
    ///
    /// Returns `Ok(None)` once the feed is exhausted, without issuing a request.
    /// On error the cursor is left where it was, so the call can be repeated.
    pub async fn next_page(&mut self) -> SocialResult<Option<Vec<Post>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.pager.fetch_page(self.cursor.as_ref()).await?;
        if page.is_exhausted() {
            info!(pages = self.pages_loaded, "feed exhausted");
            self.exhausted = true;
            return Ok(None);
        }

        self.cursor = page.next_cursor;
        self.pages_loaded += 1;
        Ok(Some(page.items))
    }

    /// Start over from the first page
    pub fn reset(&mut self) {
        self.cursor = None;
        self.exhausted = false;
        self.pages_loaded = 0;
    }
}
