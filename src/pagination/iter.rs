//! Blocking page iterator
//!
//! Same cursor threading as [`Pages`](super::Pages), for synchronous fetch
//! functions.

use super::types::{CursorRequest, CursorResponse, CursorState, EndBehavior};
use std::iter::FusedIterator;
use tracing::debug;

/// Paginate a paged operation with a blocking fetch function
///
/// The iterator ends after yielding the first fetch error.
pub fn paginate_blocking<Req, F>(initial: Req, behavior: EndBehavior, fetch: F) -> PageIter<Req, F>
where
    Req: CursorRequest,
{
    PageIter::new(initial, behavior, fetch)
}

/// Iterator of pages produced by [`paginate_blocking`]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct PageIter<Req, F>
where
    Req: CursorRequest,
{
    initial: Req,
    behavior: EndBehavior,
    fetch: F,
    state: Option<CursorState<Req::Cursor>>,
    failed: bool,
}

impl<Req, F> PageIter<Req, F>
where
    Req: CursorRequest,
{
    /// Create a new page iterator
    pub fn new(initial: Req, behavior: EndBehavior, fetch: F) -> Self {
        Self {
            initial,
            behavior,
            fetch,
            state: None,
            failed: false,
        }
    }

    /// Pages successfully fetched so far
    pub fn pages_fetched(&self) -> u64 {
        self.state.as_ref().map_or(0, |state| state.pages)
    }

    /// Token the next request would carry, or the failed page's token
    pub fn cursor(&self) -> Option<&Req::Cursor> {
        match &self.state {
            Some(state) => state.cursor.as_ref(),
            None => self.initial.cursor(),
        }
    }

    /// Whether the run ended on a fetch error
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Flatten each page into its items
    pub fn items<P, I, Out, E>(self, project: P) -> ItemIter<Self, P, I::IntoIter>
    where
        Self: Iterator<Item = Result<Out, E>>,
        P: FnMut(Out) -> Option<I>,
        I: IntoIterator,
    {
        ItemIter {
            pages: self,
            project,
            current: None,
        }
    }
}

impl<Req, F, Out, E> Iterator for PageIter<Req, F>
where
    Req: CursorRequest,
    Out: CursorResponse<Cursor = Req::Cursor>,
    F: FnMut(Req) -> Result<Out, E>,
{
    type Item = Result<Out, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let initial = &self.initial;
        let state = self
            .state
            .get_or_insert_with(|| CursorState::new(initial.cursor().cloned()));
        if !state.has_next {
            return None;
        }

        let request = state.request(initial);
        match (self.fetch)(request) {
            Ok(page) => {
                if state.advance(&self.behavior, &page).should_stop() {
                    debug!(pages = state.pages, "Pagination finished");
                }
                Some(Ok(page))
            }
            Err(e) => {
                debug!(page = state.pages + 1, "Page fetch failed, ending pagination");
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<Req, F, Out, E> FusedIterator for PageIter<Req, F>
where
    Req: CursorRequest,
    Out: CursorResponse<Cursor = Req::Cursor>,
    F: FnMut(Req) -> Result<Out, E>,
{
}

/// Iterator of items flattened out of a page iterator
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct ItemIter<Pg, P, It> {
    pages: Pg,
    project: P,
    current: Option<It>,
}

impl<Pg, P, It, Out, E, I> Iterator for ItemIter<Pg, P, It>
where
    Pg: Iterator<Item = Result<Out, E>>,
    P: FnMut(Out) -> Option<I>,
    I: IntoIterator<IntoIter = It>,
    It: Iterator<Item = I::Item>,
{
    type Item = Result<It::Item, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(items) = self.current.as_mut() {
                if let Some(item) = items.next() {
                    return Some(Ok(item));
                }
                self.current = None;
            }

            match self.pages.next()? {
                Ok(page) => self.current = (self.project)(page).map(IntoIterator::into_iter),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
