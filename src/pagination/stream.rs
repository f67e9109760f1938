//! Async page stream
//!
//! [`Pages`] is a cold, single-pass stream: nothing is fetched until it is
//! first polled, and at most one page request is in flight at any time.

use super::types::{CursorRequest, CursorResponse, CursorState, EndBehavior};
use futures::ready;
use futures::stream::{FusedStream, Stream};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// Paginate a paged operation
///
/// `fetch` is invoked once per page, with a copy of `initial` whose cursor
/// has been replaced by the token threaded from the previous page. An error
/// from `fetch` is yielded in place of the page and ends the stream; the
/// cursor is left as it was, so [`Pages::cursor`] gives the token to resume
/// a fresh run from.
pub fn paginate<Req, F, Fut>(initial: Req, behavior: EndBehavior, fetch: F) -> Pages<Req, F, Fut>
where
    Req: CursorRequest,
    F: FnMut(Req) -> Fut,
{
    Pages::new(initial, behavior, fetch)
}

pin_project! {
    /// Stream of pages produced by [`paginate`]
    #[must_use = "streams do nothing unless polled"]
    pub struct Pages<Req, F, Fut>
    where
        Req: CursorRequest,
    {
        initial: Req,
        behavior: EndBehavior,
        fetch: F,
        state: Option<CursorState<Req::Cursor>>,
        failed: bool,
        #[pin]
        in_flight: Option<Fut>,
    }
}

impl<Req, F, Fut> Pages<Req, F, Fut>
where
    Req: CursorRequest,
{
    /// Create a new page stream
    pub fn new(initial: Req, behavior: EndBehavior, fetch: F) -> Self {
        Self {
            initial,
            behavior,
            fetch,
            state: None,
            failed: false,
            in_flight: None,
        }
    }

    /// The end behavior this stream was set up with
    pub fn behavior(&self) -> &EndBehavior {
        &self.behavior
    }

    /// Pages successfully fetched so far
    pub fn pages_fetched(&self) -> u64 {
        self.state.as_ref().map_or(0, |state| state.pages)
    }

    /// Token the next request would carry
    ///
    /// After a failed fetch this is the token of the page that failed.
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
    ///
    /// `project` returns the page's item collection, or `None` when the page
    /// has none; both contribute zero items.
    pub fn items<P, I, Out, E>(self, project: P) -> Items<Self, P, I::IntoIter>
    where
        Self: Stream<Item = Result<Out, E>>,
        P: FnMut(Out) -> Option<I>,
        I: IntoIterator,
    {
        Items::new(self, project)
    }
}

impl<Req, F, Fut, Out, E> Stream for Pages<Req, F, Fut>
where
    Req: CursorRequest,
    Out: CursorResponse<Cursor = Req::Cursor>,
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = Result<Out, E>>,
{
    type Item = Result<Out, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if this.in_flight.is_none() {
            if *this.failed {
                return Poll::Ready(None);
            }
            let initial = &*this.initial;
            let state = this
                .state
                .get_or_insert_with(|| CursorState::new(initial.cursor().cloned()));
            if !state.has_next {
                return Poll::Ready(None);
            }

            let request = state.request(initial);
            trace!(page = state.pages + 1, cursor = ?state.cursor, "Fetching page");
            this.in_flight.set(Some((this.fetch)(request)));
        }

        let Some(fut) = this.in_flight.as_mut().as_pin_mut() else {
            return Poll::Ready(None);
        };
        let output = ready!(fut.poll(cx));
        this.in_flight.set(None);

        let Some(state) = this.state.as_mut() else {
            return Poll::Ready(None);
        };

        match output {
            Ok(page) => {
                if state.advance(this.behavior, &page).should_stop() {
                    debug!(pages = state.pages, "Pagination finished");
                }
                Poll::Ready(Some(Ok(page)))
            }
            Err(e) => {
                debug!(page = state.pages + 1, "Page fetch failed, ending pagination");
                *this.failed = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_terminated() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

impl<Req, F, Fut, Out, E> FusedStream for Pages<Req, F, Fut>
where
    Req: CursorRequest,
    Out: CursorResponse<Cursor = Req::Cursor>,
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = Result<Out, E>>,
{
    fn is_terminated(&self) -> bool {
        self.in_flight.is_none()
            && (self.failed || self.state.as_ref().is_some_and(|state| !state.has_next))
    }
}

// ============================================================================
// Item Projection
// ============================================================================

pin_project! {
    /// Stream of items flattened out of a page stream
    #[must_use = "streams do nothing unless polled"]
    pub struct Items<S, P, It> {
        #[pin]
        pages: S,
        project: P,
        current: Option<It>,
    }
}

impl<S, P, It> Items<S, P, It> {
    /// Flatten any stream of fallible pages
    pub fn new<Out, E, I>(pages: S, project: P) -> Self
    where
        S: Stream<Item = Result<Out, E>>,
        P: FnMut(Out) -> Option<I>,
        I: IntoIterator<IntoIter = It>,
    {
        Self {
            pages,
            project,
            current: None,
        }
    }
}

impl<S, P, It, Out, E, I> Stream for Items<S, P, It>
where
    S: Stream<Item = Result<Out, E>>,
    P: FnMut(Out) -> Option<I>,
    I: IntoIterator<IntoIter = It>,
    It: Iterator<Item = I::Item>,
{
    type Item = Result<It::Item, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(items) = this.current.as_mut() {
                if let Some(item) = items.next() {
                    return Poll::Ready(Some(Ok(item)));
                }
                *this.current = None;
            }

            match ready!(this.pages.as_mut().poll_next(cx)) {
                Some(Ok(page)) => {
                    *this.current = (this.project)(page).map(IntoIterator::into_iter);
                }
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => return Poll::Ready(None),
            }
        }
    }
}
